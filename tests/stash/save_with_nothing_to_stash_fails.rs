use crate::common::file::{write_file, FileSpec};
use crate::common::{commit_head, init_repository, repository_dir, stage, test_author};
use assert_fs::TempDir;
use bit_diff::artifacts::stash::{Stash, StashFlags};
use rstest::rstest;

#[rstest]
fn save_with_nothing_to_stash_fails(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    stage(&repo, "1.txt");
    commit_head(&repo, "initial");

    let error = Stash::new(&repo)
        .save(&test_author(), None, StashFlags::empty())
        .unwrap_err();

    assert!(error.to_string().contains("nothing to stash"));

    Ok(())
}

#[rstest]
fn save_before_the_initial_commit_fails(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));

    let error = Stash::new(&repo)
        .save(&test_author(), None, StashFlags::empty())
        .unwrap_err();

    assert!(error.to_string().contains("initial commit"));

    Ok(())
}
