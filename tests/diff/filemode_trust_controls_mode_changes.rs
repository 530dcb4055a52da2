use crate::common::file::{write_file, FileSpec};
use crate::common::{init_repository, repository_dir, stage};
use assert_fs::TempDir;
use bit_diff::artifacts::diff;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::options::{DiffFlags, DiffOptions};
use bit_diff::artifacts::index::entry_mode::{EntryMode, FileMode};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::os::unix::fs::PermissionsExt;

fn make_executable(path: &std::path::Path) {
    let mut permissions = std::fs::metadata(path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path, permissions).unwrap();
}

#[rstest]
fn exec_bit_change_is_a_modification_when_modes_are_trusted(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("run.sh"),
        "#!/bin/sh\n".to_string(),
    ));
    stage(&repo, "run.sh");
    make_executable(&repository_dir.path().join("run.sh"));

    let diff = diff::workdir_to_index(&repo, None, &DiffOptions::default())?;

    assert_eq!(diff.len(), 1);
    let delta = &diff.deltas()[0];
    assert_eq!(delta.status, DeltaStatus::Modified);
    assert_eq!(delta.old.mode, Some(EntryMode::File(FileMode::Regular)));
    assert_eq!(delta.new.mode, Some(EntryMode::File(FileMode::Executable)));

    Ok(())
}

#[rstest]
fn exec_bit_change_is_invisible_under_ignore_filemode(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("run.sh"),
        "#!/bin/sh\n".to_string(),
    ));
    stage(&repo, "run.sh");
    make_executable(&repository_dir.path().join("run.sh"));

    let diff = diff::workdir_to_index(
        &repo,
        None,
        &DiffOptions::with_flags(DiffFlags::IGNORE_FILEMODE),
    )?;

    assert!(diff.is_empty());

    Ok(())
}
