use crate::common::file::{write_file, FileSpec};
use crate::common::{blob_oid, init_repository, repository_dir, stage};
use assert_fs::TempDir;
use bit_diff::artifacts::diff;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::options::DiffOptions;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn workdir_modification_recomputes_oid(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("foo"),
        "one".to_string(),
    ));
    stage(&repo, "foo");

    // rewrite the file after staging: the workdir entry now has a stale
    // stat tuple and an unknown content identity
    write_file(FileSpec::new(
        repository_dir.path().join("foo"),
        "hello".to_string(),
    ));

    let diff = diff::workdir_to_index(&repo, None, &DiffOptions::default())?;

    assert_eq!(diff.len(), 1);
    let delta = &diff.deltas()[0];
    assert_eq!(delta.status, DeltaStatus::Modified);
    assert_eq!(&*delta.old.path, "foo");
    assert_eq!(delta.old.oid, blob_oid("one"));
    assert_eq!(delta.new.oid, blob_oid("hello"));
    assert!(delta.new.has_valid_oid());

    Ok(())
}

#[rstest]
fn untouched_workdir_entry_stays_unreported(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("foo"),
        "one".to_string(),
    ));
    stage(&repo, "foo");

    let diff = diff::workdir_to_index(&repo, None, &DiffOptions::default())?;

    assert!(diff.is_empty());

    Ok(())
}
