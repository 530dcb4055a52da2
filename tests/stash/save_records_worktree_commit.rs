use crate::common::file::{write_file, FileSpec};
use crate::common::{blob_oid, commit_head, init_repository, repository_dir, stage, test_author};
use assert_fs::TempDir;
use bit_diff::areas::refs::STASH_REF_NAME;
use bit_diff::artifacts::stash::{Stash, StashFlags};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn save_records_worktree_commit_with_three_parents(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    stage(&repo, "1.txt");
    let base_oid = commit_head(&repo, "initial");

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one modified".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("untracked.txt"),
        "new".to_string(),
    ));

    let stash_oid = Stash::new(&repo).save(
        &test_author(),
        Some("wip work"),
        StashFlags::INCLUDE_UNTRACKED,
    )?;

    // the stash reference and its reflog record the worktree commit
    assert_eq!(
        repo.refs().read_ref(STASH_REF_NAME)?,
        Some(stash_oid.clone())
    );
    let reflog = repo.refs().read_reflog(STASH_REF_NAME)?;
    assert_eq!(reflog.len(), 1);
    assert_eq!(reflog[0].message, "On master: wip work");

    let w_commit = repo
        .database()
        .parse_object_as_commit(&stash_oid)?
        .expect("worktree commit");
    assert_eq!(w_commit.message(), "On master: wip work");
    assert_eq!(w_commit.parents().len(), 3);
    assert_eq!(w_commit.parents()[0], base_oid);

    // the worktree tree carries the modified content but not the
    // untracked file
    let w_tree = repo.database().load_flat_tree(Some(w_commit.tree_oid()))?;
    assert_eq!(w_tree.get("1.txt").unwrap().oid, blob_oid("one modified"));
    assert!(!w_tree.contains_key("untracked.txt"));

    // the index commit snapshots the staged state on top of the base
    let i_commit = repo
        .database()
        .parse_object_as_commit(&w_commit.parents()[1])?
        .expect("index commit");
    assert!(i_commit.short_message().starts_with("index on master: "));
    let i_tree = repo.database().load_flat_tree(Some(i_commit.tree_oid()))?;
    assert_eq!(i_tree.get("1.txt").unwrap().oid, blob_oid("one"));

    // the untracked commit is parentless and holds only the untracked file
    let u_commit = repo
        .database()
        .parse_object_as_commit(&w_commit.parents()[2])?
        .expect("untracked commit");
    assert!(u_commit
        .short_message()
        .starts_with("untracked files on master: "));
    assert!(u_commit.parents().is_empty());
    let u_tree = repo.database().load_flat_tree(Some(u_commit.tree_oid()))?;
    assert_eq!(u_tree.get("untracked.txt").unwrap().oid, blob_oid("new"));
    assert!(!u_tree.contains_key("1.txt"));

    Ok(())
}

#[rstest]
fn save_without_untracked_flag_has_two_parents_and_wip_message(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    stage(&repo, "1.txt");
    let base_oid = commit_head(&repo, "initial");

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one modified".to_string(),
    ));

    let stash_oid = Stash::new(&repo).save(&test_author(), None, StashFlags::empty())?;

    let w_commit = repo
        .database()
        .parse_object_as_commit(&stash_oid)?
        .expect("worktree commit");
    assert_eq!(w_commit.parents().len(), 2);
    assert_eq!(
        w_commit.message(),
        format!("WIP on master: {} initial", base_oid.to_short_oid())
    );

    Ok(())
}
