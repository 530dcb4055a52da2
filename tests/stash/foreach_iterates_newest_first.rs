use crate::common::file::{write_file, FileSpec};
use crate::common::{commit_head, init_repository, repository_dir, stage, test_author};
use assert_fs::TempDir;
use bit_diff::artifacts::diff::error::DiffError;
use bit_diff::artifacts::objects::object_id::ObjectId;
use bit_diff::artifacts::stash::{Stash, StashFlags};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn two_saved_states(
    repository_dir: &TempDir,
) -> (bit_diff::areas::repository::Repository, ObjectId, ObjectId) {
    let repo = init_repository(repository_dir);

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    stage(&repo, "1.txt");
    commit_head(&repo, "initial");

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "first change".to_string(),
    ));
    let first = Stash::new(&repo)
        .save(&test_author(), Some("first"), StashFlags::empty())
        .unwrap();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "second change".to_string(),
    ));
    let second = Stash::new(&repo)
        .save(&test_author(), Some("second"), StashFlags::empty())
        .unwrap();

    (repo, first, second)
}

#[rstest]
fn foreach_iterates_newest_first(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let (repo, first, second) = two_saved_states(&repository_dir);

    let mut seen = Vec::new();
    Stash::new(&repo).foreach(|position, message, oid| {
        seen.push((position, message.to_string(), oid.clone()));
        true
    })?;

    assert_eq!(
        seen,
        vec![
            (0, "On master: second".to_string(), second),
            (1, "On master: first".to_string(), first),
        ]
    );

    Ok(())
}

#[rstest]
fn foreach_stops_on_callback_abort(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let (repo, _, _) = two_saved_states(&repository_dir);

    let mut visited = 0;
    let error = Stash::new(&repo)
        .foreach(|_, _, _| {
            visited += 1;
            false
        })
        .unwrap_err();

    assert_eq!(visited, 1);
    assert!(matches!(
        error.downcast_ref::<DiffError>(),
        Some(DiffError::UserAbort)
    ));

    Ok(())
}

#[rstest]
fn foreach_on_repository_without_stash_is_a_noop(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = init_repository(&repository_dir);

    let mut visited = 0;
    Stash::new(&repo).foreach(|_, _, _| {
        visited += 1;
        true
    })?;

    assert_eq!(visited, 0);

    Ok(())
}
