use crate::common::file::{write_file, FileSpec};
use crate::common::{blob_oid, init_repository, repository_dir};
use assert_fs::TempDir;
use bit_diff::areas::index::Index;
use bit_diff::artifacts::diff;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::options::DiffOptions;
use bit_diff::artifacts::index::entry_mode::{EntryMode, FileMode};
use bit_diff::artifacts::index::index_entry::{EntryMetadata, IndexEntry, IndexEntryFlags};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;

fn stale_entry(path: &str, content: &str, flags: IndexEntryFlags) -> IndexEntry {
    IndexEntry::new(
        PathBuf::from(path),
        blob_oid(content),
        EntryMetadata {
            mode: EntryMode::File(FileMode::Regular),
            ..Default::default()
        },
        flags,
    )
}

#[rstest]
fn skip_worktree_entries_are_never_compared(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("pinned.txt"),
        "local changes".to_string(),
    ));

    let mut index = Index::new();
    index.add(stale_entry(
        "pinned.txt",
        "committed content",
        IndexEntryFlags::SKIP_WORKTREE,
    ))?;

    let diff = diff::workdir_to_index(&repo, Some(&index), &DiffOptions::default())?;

    assert!(diff.is_empty());

    Ok(())
}

#[rstest]
fn assume_unchanged_reports_only_intent_to_add_entries(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = init_repository(&repository_dir);
    repo.config_mut().set("core.ignorestat", "true");

    write_file(FileSpec::new(
        repository_dir.path().join("quiet.txt"),
        "changed anyway".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("announced.txt"),
        "real content".to_string(),
    ));

    let mut index = Index::new();
    index.add(stale_entry(
        "quiet.txt",
        "original",
        IndexEntryFlags::empty(),
    ))?;
    index.add(stale_entry(
        "announced.txt",
        "placeholder",
        IndexEntryFlags::INTENT_TO_ADD,
    ))?;

    let diff = diff::workdir_to_index(&repo, Some(&index), &DiffOptions::default())?;

    assert_eq!(diff.len(), 1);
    let delta = &diff.deltas()[0];
    assert_eq!(&*delta.old.path, "announced.txt");
    assert_eq!(delta.status, DeltaStatus::Modified);
    assert_eq!(delta.new.oid, blob_oid("real content"));

    Ok(())
}
