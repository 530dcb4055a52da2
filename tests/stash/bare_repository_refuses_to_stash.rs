use crate::common::{init_repository, repository_dir, test_author};
use assert_fs::TempDir;
use bit_diff::artifacts::stash::{Stash, StashFlags};
use rstest::rstest;

#[rstest]
fn bare_repository_refuses_to_stash(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut repo = init_repository(&repository_dir);
    repo.config_mut().set("core.bare", "true");

    let error = Stash::new(&repo)
        .save(&test_author(), None, StashFlags::empty())
        .unwrap_err();

    assert!(error.to_string().contains("require a working directory"));

    Ok(())
}
