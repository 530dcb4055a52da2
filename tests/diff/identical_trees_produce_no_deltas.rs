use crate::common::file::{write_file, FileSpec};
use crate::common::{commit_head, delta_summary, head_tree, init_repository, repository_dir, stage};
use assert_fs::TempDir;
use bit_diff::artifacts::diff;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::options::{DiffFlags, DiffOptions};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn identical_trees_produce_no_deltas(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(repository_dir.path().join("a"), "A".to_string()));
    write_file(FileSpec::new(repository_dir.path().join("b"), "B".to_string()));
    stage(&repo, "a");
    stage(&repo, "b");
    commit_head(&repo, "initial");
    let tree = head_tree(&repo);

    let diff = diff::tree_to_tree(&repo, Some(&tree), Some(&tree), &DiffOptions::default())?;

    assert!(diff.is_empty());

    let diff = diff::tree_to_tree(
        &repo,
        Some(&tree),
        Some(&tree),
        &DiffOptions::with_flags(DiffFlags::INCLUDE_UNMODIFIED),
    )?;

    assert_eq!(
        delta_summary(&diff),
        vec![
            ("a".to_string(), DeltaStatus::Unmodified),
            ("b".to_string(), DeltaStatus::Unmodified),
        ]
    );

    Ok(())
}
