#![allow(dead_code)]


use assert_fs::TempDir;
use bit_diff::areas::database::Database;
use bit_diff::areas::repository::Repository;
use bit_diff::artifacts::diff::delta::DeltaStatus;
use bit_diff::artifacts::diff::diff_list::DiffList;
use bit_diff::artifacts::objects::commit::{Author, Commit};
use bit_diff::artifacts::objects::object::Object;
use bit_diff::artifacts::objects::object_id::ObjectId;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

pub fn init_repository(dir: &TempDir) -> Repository {
    Repository::init(dir.path().to_path_buf()).expect("Failed to initialize repository")
}

pub fn test_author() -> Author {
    Author::new_with_timestamp(
        "Test Stasher".to_string(),
        "stasher@example.com".to_string(),
        chrono::DateTime::parse_from_rfc3339("2024-03-01T10:00:00+02:00").unwrap(),
    )
}

/// Stage a workspace file into the repository's index
pub fn stage(repo: &Repository, rel_path: &str) {
    repo.index_mut()
        .unwrap()
        .add_from_workdir(repo.workspace(), repo.database(), Path::new(rel_path))
        .unwrap_or_else(|e| panic!("Failed to stage {}: {}", rel_path, e));
}

/// Commit the current index onto HEAD's branch
pub fn commit_head(repo: &Repository, message: &str) -> ObjectId {
    let tree_oid = repo
        .index()
        .unwrap()
        .write_tree(repo.database())
        .expect("Failed to write tree");

    let parents = repo.refs().read_head().unwrap().into_iter().collect();
    let commit = Commit::new(parents, tree_oid, test_author(), message.to_string());
    let commit_oid = commit.object_id().unwrap();

    repo.database().store(commit).expect("Failed to store commit");
    repo.refs()
        .update_ref("refs/heads/master", &commit_oid)
        .expect("Failed to update branch");

    commit_oid
}

/// The tree of the commit HEAD points at
pub fn head_tree(repo: &Repository) -> ObjectId {
    repo.head_commit()
        .unwrap()
        .expect("HEAD has no commit")
        .tree_oid()
        .clone()
}

/// The blob hash of the given content
pub fn blob_oid(content: &str) -> ObjectId {
    Database::hash_blob(content.as_bytes()).unwrap()
}

/// Compact view of a diff for assertions: (path, status) in store order
pub fn delta_summary(diff: &DiffList) -> Vec<(String, DeltaStatus)> {
    diff.deltas()
        .iter()
        .map(|delta| (delta.path().to_string(), delta.status))
        .collect()
}
