#![allow(clippy::unwrap_used, clippy::expect_used)]
//! File-operation blocks: reset, line insertion, and line replacement.

mod common;

use common::{docci, write_doc};
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn file_edit_pipeline_resets_inserts_and_replaces() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "\
```text docci-file=app.txt docci-reset-file
line one
line two
line three
```

```text docci-file=app.txt docci-line-insert=2
inserted
```

```text docci-file=app.txt docci-line-replace=1
first
```

```bash docci-output-contains=\"first\"
cat app.txt
```
",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .arg("--working-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "first\ninserted\nline two\nline three",
        ));

    let content = std::fs::read_to_string(dir.path().join("app.txt")).unwrap();
    assert_eq!(content, "first\ninserted\nline two\nline three\n");
}

#[test]
fn line_insert_past_eof_appends() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "\
```text docci-file=notes.txt docci-reset-file
line one
line two
```

```text docci-file=notes.txt docci-line-insert=99
appended
```
",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .arg("--working-dir")
        .arg(dir.path())
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
    assert_eq!(content, "line one\nline two\nappended\n");
}

#[test]
fn line_replace_past_eof_replaces_existing_suffix_only() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "\
```text docci-file=notes.txt docci-reset-file
line one
line two
line three
```

```text docci-file=notes.txt docci-line-replace=2-99
tail
```
",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .arg("--working-dir")
        .arg(dir.path())
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
    assert_eq!(content, "line one\ntail\n");
}

#[test]
fn line_edit_on_missing_file_fails_with_diagnostic() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "```text docci-file=ghost.txt docci-line-insert=1\nbody\n```\n",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .arg("--working-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot edit missing file: ghost.txt"));
}

#[test]
fn if_file_not_exists_guard_skips_second_run() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "```bash docci-if-file-not-exists=done.marker\ntouch done.marker\necho created\n```\n",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .arg("--working-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    docci()
        .arg("run")
        .arg(&doc)
        .arg("--working-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("created").not())
        .stdout(predicate::str::contains("done.marker exists, skipping block 1"));
}
