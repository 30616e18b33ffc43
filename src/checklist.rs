use std::collections::HashSet;

use crate::diff;
use crate::rules::{self, CompiledRule};

/// Header line of a rendered checklist. Doubles as the marker used to find a
/// previously posted checklist comment.
pub const CHECKLIST_HEADER: &str = "**Checklist:**";

/// Deduplicate checklist items by exact string equality, keeping
/// first-occurrence order. Identical items with different path suffixes are
/// distinct strings and both survive.
pub fn assemble(raw_items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw_items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Render a checklist as Markdown: header plus one `- [ ]` line per item,
/// no trailing newline. An empty checklist renders as an empty string, the
/// "nothing to post" sentinel.
pub fn format(checklist: &[String]) -> String {
    if checklist.is_empty() {
        return String::new();
    }
    let mut out = String::from(CHECKLIST_HEADER);
    for item in checklist {
        out.push_str("\n- [ ] ");
        out.push_str(item);
    }
    out
}

/// Full pipeline: normalize the diff, evaluate the rule table, deduplicate,
/// and format. Pure; configuration defects are caught earlier at rule
/// compilation.
pub fn render(raw_diff: &str, rules: &[CompiledRule]) -> String {
    let changes = diff::normalize(raw_diff);
    let items = rules::evaluate(&changes, rules);
    format(&assemble(items))
}
