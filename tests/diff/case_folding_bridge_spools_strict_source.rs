use crate::common::file::{write_file, FileSpec};
use crate::common::{blob_oid, commit_head, head_tree, init_repository, repository_dir, stage};
use assert_fs::TempDir;
use bit_diff::areas::index::Index;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::merge_join;
use bit_diff::artifacts::diff::options::{DiffFlags, DiffOptions};
use bit_diff::artifacts::diff::source::{SourceKind, TreeSource};
use bit_diff::artifacts::index::entry_mode::{EntryMode, FileMode};
use bit_diff::artifacts::index::index_entry::{EntryMetadata, IndexEntry, IndexEntryFlags};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;

#[rstest]
fn case_folding_bridge_spools_strict_source(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    // old tree holds "Foo"
    write_file(FileSpec::new(
        repository_dir.path().join("Foo"),
        "same content".to_string(),
    ));
    stage(&repo, "Foo");
    commit_head(&repo, "initial");
    let old_tree = head_tree(&repo);

    // new tree holds "foo" with identical content
    let mut lowercase_index = Index::new();
    lowercase_index.add(IndexEntry::new(
        PathBuf::from("foo"),
        blob_oid("same content"),
        EntryMetadata {
            mode: EntryMode::File(FileMode::Regular),
            ..Default::default()
        },
        IndexEntryFlags::empty(),
    ))?;
    let new_tree = lowercase_index.write_tree(repo.database())?;

    let old_src = TreeSource::for_tree_range(repo.database(), Some(&old_tree), "")?;
    let new_src =
        TreeSource::for_tree_range(repo.database(), Some(&new_tree), "")?.with_ignore_case(true);

    let diff = merge_join::from_sources(
        &repo,
        Box::new(old_src),
        Box::new(new_src),
        &DiffOptions::with_flags(DiffFlags::INCLUDE_UNMODIFIED),
    )?;

    // the strict side was spooled; the paths coincide under case folding
    assert!(diff.is_icase());
    assert!(diff.options().flags.contains(DiffFlags::DELTAS_ARE_ICASE));
    assert_eq!(diff.sources(), (SourceKind::Tree, SourceKind::Tree));
    assert_eq!(diff.len(), 1);
    assert_eq!(diff.deltas()[0].status, DeltaStatus::Unmodified);

    Ok(())
}

#[rstest]
fn case_folded_coincidence_with_differing_content_is_modified(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("Foo"),
        "old content".to_string(),
    ));
    stage(&repo, "Foo");
    commit_head(&repo, "initial");
    let old_tree = head_tree(&repo);

    let mut lowercase_index = Index::new();
    lowercase_index.add(IndexEntry::new(
        PathBuf::from("foo"),
        blob_oid("new content"),
        EntryMetadata {
            mode: EntryMode::File(FileMode::Regular),
            ..Default::default()
        },
        IndexEntryFlags::empty(),
    ))?;
    let new_tree = lowercase_index.write_tree(repo.database())?;

    let old_src = TreeSource::for_tree_range(repo.database(), Some(&old_tree), "")?;
    let new_src =
        TreeSource::for_tree_range(repo.database(), Some(&new_tree), "")?.with_ignore_case(true);

    let diff = merge_join::from_sources(
        &repo,
        Box::new(old_src),
        Box::new(new_src),
        &DiffOptions::default(),
    )?;

    assert_eq!(diff.len(), 1);
    assert_eq!(diff.deltas()[0].status, DeltaStatus::Modified);

    Ok(())
}
