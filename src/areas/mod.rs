//! Storage areas of a repository
//!
//! - `config`: Repository configuration lookup
//! - `database`: Object storage (blobs, trees, commits)
//! - `index`: Staging area for tracking changes
//! - `refs`: Reference and reflog management
//! - `repository`: Facade coordinating the areas
//! - `workspace`: Working directory operations

pub mod config;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
