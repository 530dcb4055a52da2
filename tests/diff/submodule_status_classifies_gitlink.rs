use crate::common::file::create_directory;
use crate::common::{init_repository, repository_dir};
use assert_fs::TempDir;
use bit_diff::artifacts::diff;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::options::{DiffFlags, DiffOptions};
use bit_diff::artifacts::index::entry_mode::EntryMode;
use bit_diff::artifacts::index::index_entry::{EntryMetadata, IndexEntry, IndexEntryFlags};
use bit_diff::artifacts::objects::object_id::ObjectId;
use bit_diff::artifacts::submodule::{Submodule, SubmoduleIgnore, SubmoduleStatus};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;

fn pinned_oid() -> ObjectId {
    ObjectId::try_parse("1111111111111111111111111111111111111111".to_string()).unwrap()
}

fn checked_out_oid() -> ObjectId {
    ObjectId::try_parse("2222222222222222222222222222222222222222".to_string()).unwrap()
}

fn stage_gitlink(repo: &bit_diff::areas::repository::Repository) {
    repo.index_mut()
        .unwrap()
        .add(IndexEntry::new(
            PathBuf::from("vendor/lib"),
            pinned_oid(),
            EntryMetadata {
                mode: EntryMode::Gitlink,
                ..Default::default()
            },
            IndexEntryFlags::empty(),
        ))
        .unwrap();
}

#[rstest]
fn moved_submodule_reports_modified_with_substitute_oid(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = init_repository(&repository_dir);

    create_directory(&repository_dir.path().join("vendor").join("lib"));
    repo.submodules_mut().register(Submodule::new(
        "vendor/lib".to_string(),
        SubmoduleIgnore::None,
        SubmoduleStatus::WD_MODIFIED,
        Some(checked_out_oid()),
    ));
    stage_gitlink(&repo);

    let diff = diff::workdir_to_index(&repo, None, &DiffOptions::default())?;

    assert_eq!(diff.len(), 1);
    let delta = &diff.deltas()[0];
    assert_eq!(delta.status, DeltaStatus::Modified);
    assert_eq!(&*delta.old.path, "vendor/lib");
    assert_eq!(delta.old.oid, pinned_oid());
    assert_eq!(delta.new.oid, checked_out_oid());
    assert!(delta.new.has_valid_oid());

    Ok(())
}

#[rstest]
fn ignored_submodules_count_as_unmodified(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = init_repository(&repository_dir);

    create_directory(&repository_dir.path().join("vendor").join("lib"));
    repo.submodules_mut().register(Submodule::new(
        "vendor/lib".to_string(),
        SubmoduleIgnore::None,
        SubmoduleStatus::WD_MODIFIED,
        Some(checked_out_oid()),
    ));
    stage_gitlink(&repo);

    let diff = diff::workdir_to_index(
        &repo,
        None,
        &DiffOptions::with_flags(DiffFlags::IGNORE_SUBMODULES),
    )?;

    assert!(diff.is_empty());

    Ok(())
}

#[rstest]
fn clean_submodule_with_all_ignore_policy_is_unmodified(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = init_repository(&repository_dir);

    create_directory(&repository_dir.path().join("vendor").join("lib"));
    repo.submodules_mut().register(Submodule::new(
        "vendor/lib".to_string(),
        SubmoduleIgnore::All,
        SubmoduleStatus::WD_MODIFIED,
        Some(checked_out_oid()),
    ));
    stage_gitlink(&repo);

    let diff = diff::workdir_to_index(&repo, None, &DiffOptions::default())?;

    assert!(diff.is_empty());

    Ok(())
}
