#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Parse-time failures: tag combinations, dangling references, and the
//! validate command.

mod common;

use common::{docci, write_doc};
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn incompatible_tags_fail_before_execution() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "```bash docci-output-contains=\"x\" docci-background\necho side-effect\n```\n",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Cannot use both docci-output-contains and docci-background",
        ))
        .stdout(predicate::str::contains("side-effect").not());
}

#[test]
fn dangling_background_kill_lists_available_indexes() {
    let dir = tempdir().unwrap();
    // The only background block lands at index 2; killing "1" dangles.
    let doc = write_doc(
        &dir,
        "README.md",
        "\
```bash
echo first
```

```bash docci-background
sleep 1
```

```bash docci-background-kill=1
true
```
",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "references a non-existent background process. Available background process indexes: [2]",
        ));
}

#[test]
fn unknown_tag_is_rejected_with_line_number() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "# Title\n\n```bash docci-made-up\necho hi\n```\n",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tag 'docci-made-up'"))
        .stderr(predicate::str::contains(":3"));
}

#[test]
fn validate_accepts_a_clean_document() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "```bash docci-retry=2\necho hi\n```\n\n```text docci-file=out.txt\ncontent\n```\n",
    );

    docci()
        .arg("validate")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 runnable block(s)"))
        .stdout(predicate::str::contains("file-op"));
}

#[test]
fn validate_rejects_a_broken_document_with_exit_one() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "```bash docci-retry=abc\necho hi\n```\n",
    );

    docci()
        .arg("validate")
        .arg(&doc)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid integer 'abc' for docci-retry"));
}

#[test]
fn validate_emits_json_summaries() {
    let dir = tempdir().unwrap();
    let doc = write_doc(&dir, "README.md", "```bash\necho hi\n```\n");

    let output = docci()
        .arg("validate")
        .arg(&doc)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let summaries = parsed.as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["index"], 1);
    assert_eq!(summaries[0]["language"], "bash");
}
