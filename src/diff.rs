use tracing::debug;

/// Insertion-ordered map from file identifier to lower-cased added-line text.
///
/// A renamed file appears under both its old and new path with the same
/// change text; a file with no added lines still gets an entry with an empty
/// string. Inserting an existing key replaces its text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: Vec<(String, String)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, text: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(p, _)| p == path) {
            entry.1 = text.to_string();
        } else {
            self.entries.push((path.to_string(), text.to_string()));
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(path, text)| (path.as_str(), text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Change text of every entry, newline-joined in insertion order.
    pub fn all_text(&self) -> String {
        let texts: Vec<&str> = self.entries.iter().map(|(_, text)| text.as_str()).collect();
        texts.join("\n")
    }
}

/// One file section of a unified diff while it is being parsed.
#[derive(Debug, Default)]
struct FileSection {
    old_path: Option<String>,
    new_path: Option<String>,
    added: Vec<String>,
    in_hunk: bool,
}

impl FileSection {
    fn register(self, changes: &mut ChangeSet) {
        if self.old_path.is_none() && self.new_path.is_none() {
            return;
        }
        let text = self.added.join("\n").to_lowercase();
        if let Some(old) = &self.old_path {
            changes.insert(old, &text);
        }
        if let Some(new) = &self.new_path {
            changes.insert(new, &text);
        }
    }
}

/// Parse a unified diff into per-file added-line text.
///
/// Best-effort and total: unrecognized lines are skipped, so malformed or
/// non-diff input degrades to an empty (or partial) `ChangeSet` rather than
/// failing. Removed and context lines are excluded; added-line content is
/// concatenated per file in hunk order and lower-cased as a whole.
pub fn normalize(raw_diff: &str) -> ChangeSet {
    let mut changes = ChangeSet::new();
    let mut section: Option<FileSection> = None;

    for line in raw_diff.lines() {
        if let Some(header) = line.strip_prefix("diff --git ") {
            if let Some(previous) = section.take() {
                previous.register(&mut changes);
            }
            section = Some(section_from_git_header(header));
            continue;
        }

        // Plain `diff -u` output has no `diff --git` boundary; a `--- ` line
        // after a hunk starts the next file section.
        if line.starts_with("--- ") && section.as_ref().is_none_or(|s| s.in_hunk) {
            if let Some(previous) = section.take() {
                previous.register(&mut changes);
            }
            section = Some(FileSection::default());
        }

        let Some(current) = section.as_mut() else {
            continue;
        };

        if current.in_hunk {
            // Hunk headers, context, and removed lines fall through untouched.
            if let Some(content) = line.strip_prefix('+') {
                current.added.push(content.trim_end_matches('\r').to_string());
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            current.old_path = parse_marker_path(path, "a/");
        } else if let Some(path) = line.strip_prefix("+++ ") {
            current.new_path = parse_marker_path(path, "b/");
        } else if let Some(path) = line.strip_prefix("rename from ") {
            current.old_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("rename to ") {
            current.new_path = Some(path.to_string());
        } else if line.starts_with("@@") {
            current.in_hunk = true;
        }
    }

    if let Some(last) = section.take() {
        last.register(&mut changes);
    }

    debug!(files = changes.len(), "normalized diff");
    changes
}

/// Seed a section from a `diff --git a/X b/Y` header so files with no hunks
/// (mode changes, binary files) still appear in the change set.
fn section_from_git_header(header: &str) -> FileSection {
    let mut section = FileSection::default();
    if let Some(split) = header.find(" b/")
        && let Some(old) = header[..split].strip_prefix("a/")
    {
        section.old_path = Some(old.to_string());
        section.new_path = Some(header[split + 3..].to_string());
    }
    section
}

/// Extract the path from a `--- `/`+++ ` marker line. `/dev/null` means the
/// file has no pre- or post-change side; a trailing tab separates optional
/// metadata in some diff flavors.
fn parse_marker_path(raw: &str, prefix: &str) -> Option<String> {
    let raw = raw.split('\t').next().unwrap_or(raw).trim_end_matches('\r');
    if raw == "/dev/null" {
        return None;
    }
    let path = raw.strip_prefix(prefix).unwrap_or(raw);
    Some(path.to_string())
}
