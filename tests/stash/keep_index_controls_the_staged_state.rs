use crate::common::file::{write_file, FileSpec};
use crate::common::{blob_oid, commit_head, init_repository, repository_dir, stage, test_author};
use assert_fs::TempDir;
use bit_diff::areas::repository::Repository;
use bit_diff::artifacts::stash::{Stash, StashFlags};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;

fn repository_with_staged_addition(repository_dir: &TempDir) -> Repository {
    let repo = init_repository(repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    stage(&repo, "1.txt");
    commit_head(&repo, "initial");

    write_file(FileSpec::new(
        repository_dir.path().join("staged.txt"),
        "staged".to_string(),
    ));
    stage(&repo, "staged.txt");

    repo
}

#[rstest]
fn save_rolls_the_index_back_to_the_base_tree(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = repository_with_staged_addition(&repository_dir);

    let stash_oid = Stash::new(&repo).save(&test_author(), None, StashFlags::empty())?;

    // the staged addition was captured by the stash...
    let w_commit = repo
        .database()
        .parse_object_as_commit(&stash_oid)?
        .expect("worktree commit");
    let w_tree = repo.database().load_flat_tree(Some(w_commit.tree_oid()))?;
    assert_eq!(w_tree.get("staged.txt").unwrap().oid, blob_oid("staged"));

    // ...and the index no longer carries it
    let index = repo.index()?;
    assert!(index.entry_by_path(Path::new("staged.txt")).is_none());
    assert!(index.entry_by_path(Path::new("1.txt")).is_some());

    Ok(())
}

#[rstest]
fn keep_index_leaves_the_staged_state_in_place(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = repository_with_staged_addition(&repository_dir);

    Stash::new(&repo).save(&test_author(), None, StashFlags::KEEP_INDEX)?;

    let index = repo.index()?;
    assert_eq!(
        index.entry_by_path(Path::new("staged.txt")).unwrap().oid,
        blob_oid("staged")
    );

    Ok(())
}
