use crate::common::file::{write_file, FileSpec};
use crate::common::{blob_oid, commit_head, head_tree, init_repository, repository_dir, stage};
use assert_fs::TempDir;
use bit_diff::artifacts::diff;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::options::DiffOptions;
use fake::faker::lorem::en::Words;
use fake::Fake;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn pure_addition_between_trees(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(repository_dir.path().join("a"), "A".to_string()));
    stage(&repo, "a");
    commit_head(&repo, "first");
    let old_tree = head_tree(&repo);

    let content = Words(3..6).fake::<Vec<String>>().join(" ");
    write_file(FileSpec::new(
        repository_dir.path().join("b"),
        content.clone(),
    ));
    stage(&repo, "b");
    commit_head(&repo, "second");
    let new_tree = head_tree(&repo);

    let diff = diff::tree_to_tree(&repo, Some(&old_tree), Some(&new_tree), &DiffOptions::default())?;

    assert_eq!(diff.len(), 1);
    let delta = &diff.deltas()[0];
    assert_eq!(delta.status, DeltaStatus::Added);
    assert_eq!(&*delta.new.path, "b");
    assert_eq!(delta.new.oid, blob_oid(&content));
    assert!(delta.new.has_valid_oid());
    assert!(delta.old.mode.is_none());

    Ok(())
}
