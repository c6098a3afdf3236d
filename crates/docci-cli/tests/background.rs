#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Background block lifecycle: launch, kill, and log replay.

mod common;

use common::{docci, write_doc};
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn background_block_is_killed_and_its_logs_replayed() {
    let dir = tempdir().unwrap();
    let doc = write_doc(
        &dir,
        "README.md",
        "\
```bash docci-background
echo bg-ready
sleep 30
```

```bash
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
        .success()
        .stdout(predicate::str::contains("Starting background block 1"))
        .stdout(predicate::str::contains("Stopping background block 1"))
        .stdout(predicate::str::contains("=== Background logs for block 1 ==="))
        .stdout(predicate::str::contains("bg-ready"));

    // The scratch file is created and removed within the run.
    assert!(!std::path::Path::new("/tmp/docci_bg_1.out").exists());
}

#[test]
fn hidden_background_logs_are_removed_without_replay() {
    let dir = tempdir().unwrap();
    // A leading foreground block shifts the background block to index 2,
    // keeping its scratch file distinct from the other test's.
    let doc = write_doc(
        &dir,
        "README.md",
        "\
```bash
true
```

```bash docci-background
echo hidden-bg-note
```

```bash
sleep 1
```
",
    );

    docci()
        .arg("run")
        .arg(&doc)
        .arg("--hide-background-logs")
        .assert()
        .success()
        .stdout(predicate::str::contains("Background logs").not())
        .stdout(predicate::str::contains("hidden-bg-note").not());

    assert!(!std::path::Path::new("/tmp/docci_bg_2.out").exists());
}
