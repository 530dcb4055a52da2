use crate::common::file::{write_file, FileSpec};
use crate::common::{commit_head, init_repository, repository_dir, stage, test_author};
use assert_fs::TempDir;
use bit_diff::areas::refs::STASH_REF_NAME;
use bit_diff::artifacts::stash::{Stash, StashFlags};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn drop_removes_states_and_reference(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    stage(&repo, "1.txt");
    commit_head(&repo, "initial");

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "first change".to_string(),
    ));
    let first = Stash::new(&repo).save(&test_author(), Some("first"), StashFlags::empty())?;

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "second change".to_string(),
    ));
    Stash::new(&repo).save(&test_author(), Some("second"), StashFlags::empty())?;

    // dropping the newest state repoints the reference at the older one
    Stash::new(&repo).drop(0)?;
    assert_eq!(repo.refs().read_ref(STASH_REF_NAME)?, Some(first.clone()));
    assert_eq!(repo.refs().read_reflog(STASH_REF_NAME)?.len(), 1);

    // dropping the last state removes the reference entirely
    Stash::new(&repo).drop(0)?;
    assert_eq!(repo.refs().read_ref(STASH_REF_NAME)?, None);
    assert!(repo.refs().read_reflog(STASH_REF_NAME)?.is_empty());

    Ok(())
}

#[rstest]
fn drop_of_missing_position_fails(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    stage(&repo, "1.txt");
    commit_head(&repo, "initial");

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "changed".to_string(),
    ));
    Stash::new(&repo).save(&test_author(), None, StashFlags::empty())?;

    let error = Stash::new(&repo).drop(5).unwrap_err();
    assert!(error.to_string().contains("No stashed state at position 5"));

    Stash::new(&repo).drop(0)?;
    let error = Stash::new(&repo).drop(0).unwrap_err();
    assert!(error.to_string().contains("not found"));

    Ok(())
}
