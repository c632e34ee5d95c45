use std::fs;

use po_merge_rust::{LanguageFiles, RunOptions, SearchMode, run_merge};

#[tokio::test]
async fn run_summary_snapshot() {
    let target = tempfile::tempdir().unwrap();
    let reference = tempfile::tempdir().unwrap();
    fs::write(
        target.path().join("a.po"),
        "msgid \"hello\"\nmsgstr \"\"\n\nmsgid \"gone\"\nmsgstr \"\"\n",
    )
    .unwrap();
    fs::write(target.path().join("b.po"), "msgid \"x\"\nmsgstr \"\"\n").unwrap();
    fs::write(target.path().join("c.po"), "msgid \"x\"\nmsgstr \"X\"\n").unwrap();
    fs::write(
        reference.path().join("a.po"),
        "msgid \"hello\"\nmsgstr \"bonjour\"\n",
    )
    .unwrap();

    let report = run_merge(
        &LanguageFiles::new(target.path(), ["a.po", "b.po", "c.po"]),
        &LanguageFiles::new(reference.path(), ["a.po"]),
        &RunOptions {
            search: SearchMode::default(),
            concurrency: 2,
            dry_run: false,
        },
    )
    .await;

    insta::assert_snapshot!(report.summary(), @r"
    merged     a.po (1 substitutions, 1 unresolved)
    skipped    b.po: no reference file
    up-to-date c.po
    substitutions: 1, warnings: 2
    ");
}
