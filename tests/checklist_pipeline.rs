use ticklist::checklist;
use ticklist::diff;
use ticklist::rules;

const RULES_JSON: &str = r#"{
    "mappings": [
        {
            "triggers": ["create index", "createIndex"],
            "items": ["Indexes have been created concurrently in big tables"]
        },
        {
            "triggers": ["connection", "session", "statement"],
            "items": ["Resources have been closed in finally block or using try-with-resources"]
        },
        {
            "triggers": ["secret", "password|passwd"],
            "items": ["No credentials are committed"],
            "paths": ["**/*.env", "config/**"]
        },
        {
            "triggers": "always",
            "items": ["PR description explains the why"]
        }
    ]
}"#;

const PR_DIFF: &str = "\
diff --git a/src/db/migrate.sql b/src/db/migrate.sql
index 1111111..2222222 100644
--- a/src/db/migrate.sql
+++ b/src/db/migrate.sql
@@ -1,2 +1,4 @@
 -- schema
+CREATE INDEX order_number_customer_id ON orders (order_number, customer_id);
+ALTER TABLE orders ADD COLUMN region TEXT;
diff --git a/src/app/Repo.java b/src/app/Repo.java
index 3333333..4444444 100644
--- a/src/app/Repo.java
+++ b/src/app/Repo.java
@@ -10,3 +10,4 @@
 class Repo {
+    Connection connection = new Connection();
 }
diff --git a/config/staging.yml b/config/staging.yml
index 5555555..6666666 100644
--- a/config/staging.yml
+++ b/config/staging.yml
@@ -1,2 +1,3 @@
 db:
+  password: hunter2
";

#[test]
fn full_pipeline_matches_expected_markdown() {
    let rules = rules::parse(RULES_JSON).unwrap();
    let out = checklist::render(PR_DIFF, &rules);
    assert_eq!(
        out,
        "**Checklist:**\n\
         - [ ] Indexes have been created concurrently in big tables\n\
         - [ ] Resources have been closed in finally block or using try-with-resources\n\
         - [ ] No credentials are committed (config/staging.yml)\n\
         - [ ] PR description explains the why"
    );
}

#[test]
fn database_review_rules_end_to_end() {
    let rules = rules::parse(
        r#"{
            "mappings": [
                {"triggers": ["create index", "createIndex"],
                 "items": ["Indexes have been created concurrently in big tables"]},
                {"triggers": ["connection", "session"],
                 "items": ["Resources have been closed in finally block or using try-with-resources"]}
            ]
        }"#,
    )
    .unwrap();
    let diff = "\
diff --git a/a.java b/a.java
--- a/a.java
+++ b/a.java
@@ -0,0 +1,2 @@
+create index order_number_customer_id
+Connection connection = new Connection()
";
    assert_eq!(
        checklist::render(diff, &rules),
        "**Checklist:**\n\
         - [ ] Indexes have been created concurrently in big tables\n\
         - [ ] Resources have been closed in finally block or using try-with-resources"
    );
}

#[test]
fn empty_diff_renders_nothing_without_always_rules() {
    let rules = rules::parse(
        r#"{"mappings": [{"triggers": ["anything"], "items": ["x"]}]}"#,
    )
    .unwrap();
    assert_eq!(checklist::render("", &rules), "");
}

#[test]
fn garbage_diff_degrades_to_no_match() {
    let rules = rules::parse(
        r#"{"mappings": [{"triggers": ["anything"], "items": ["x"]}]}"#,
    )
    .unwrap();
    let out = checklist::render("<html>definitely not a diff</html>", &rules);
    assert_eq!(out, "");
}

#[test]
fn renamed_file_matches_globs_on_either_path() {
    let diff = "\
diff --git a/lib/handlers.py b/src/handlers.py
similarity index 80%
rename from lib/handlers.py
rename to src/handlers.py
--- a/lib/handlers.py
+++ b/src/handlers.py
@@ -1 +1,2 @@
 import os
+import subprocess
";
    let rules = rules::parse(
        r#"{"mappings": [{"triggers": ["subprocess"], "items": ["Shelling out is reviewed"], "paths": ["lib/**"]}]}"#,
    )
    .unwrap();
    // The old path still matches a lib/** scope after the rename.
    assert_eq!(
        checklist::render(diff, &rules),
        "**Checklist:**\n- [ ] Shelling out is reviewed (lib/handlers.py)"
    );
}

#[test]
fn duplicate_items_across_rules_render_once() {
    let rules = rules::parse(
        r#"{
            "mappings": [
                {"triggers": ["alpha"], "items": ["Shared reminder"]},
                {"triggers": ["beta"], "items": ["Shared reminder", "Second"]}
            ]
        }"#,
    )
    .unwrap();
    let diff = "\
diff --git a/f.txt b/f.txt
--- a/f.txt
+++ b/f.txt
@@ -0,0 +1 @@
+alpha beta
";
    assert_eq!(
        checklist::render(diff, &rules),
        "**Checklist:**\n- [ ] Shared reminder\n- [ ] Second"
    );
}

#[test]
fn pipeline_is_pure_and_idempotent() {
    let rules = rules::parse(RULES_JSON).unwrap();
    let changes = diff::normalize(PR_DIFF);
    let first = checklist::render(PR_DIFF, &rules);
    let second = checklist::render(PR_DIFF, &rules);
    assert_eq!(first, second);
    // Normalization is independent of rule evaluation.
    assert_eq!(changes, diff::normalize(PR_DIFF));
}
