use crate::common::file::{write_file, FileSpec};
use crate::common::{commit_head, delta_summary, init_repository, repository_dir, stage};
use assert_fs::TempDir;
use bit_diff::artifacts::diff;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::options::{DiffFlags, DiffOptions};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn ignored_directory_contents_are_skipped(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join(".gitignore"),
        "build/\n".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("tracked.txt"),
        "tracked".to_string(),
    ));
    stage(&repo, ".gitignore");
    stage(&repo, "tracked.txt");
    commit_head(&repo, "initial");

    write_file(FileSpec::new(
        repository_dir.path().join("build").join("x"),
        "object".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("build").join("y"),
        "object".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("loose.txt"),
        "untracked".to_string(),
    ));

    let diff = diff::workdir_to_index(
        &repo,
        None,
        &DiffOptions::with_flags(
            DiffFlags::INCLUDE_UNTRACKED | DiffFlags::RECURSE_UNTRACKED_DIRS,
        ),
    )?;

    // files under the ignored directory are skipped outright, even though
    // untracked recursion was requested; the loose file still shows up
    assert_eq!(
        delta_summary(&diff),
        vec![("loose.txt".to_string(), DeltaStatus::Untracked)]
    );

    Ok(())
}

#[rstest]
fn ignored_directory_itself_is_reported_when_requested(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join(".gitignore"),
        "build/\n".to_string(),
    ));
    stage(&repo, ".gitignore");
    commit_head(&repo, "initial");

    write_file(FileSpec::new(
        repository_dir.path().join("build").join("x"),
        "object".to_string(),
    ));

    // without untracked recursion the directory is not descended; it is
    // classified by its own ignore match instead
    let diff = diff::workdir_to_index(
        &repo,
        None,
        &DiffOptions::with_flags(DiffFlags::INCLUDE_IGNORED | DiffFlags::INCLUDE_UNTRACKED),
    )?;

    assert_eq!(
        delta_summary(&diff),
        vec![("build/".to_string(), DeltaStatus::Ignored)]
    );

    Ok(())
}
