// Default locations shared by the binaries.

use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Where plots and tables go unless told otherwise.
pub fn get_workspace() -> PathBuf {
    PathBuf::from("results")
}

/// Creates `dir` if needed. The caller is responsible for asking first.
pub fn ensure_out_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir).map_err(|err| AnalysisError::io(dir, err))?;
        log::info!("created directory {dir:?}");
    }
    Ok(dir.to_owned())
}

#[test]
fn creates_nested_directories() {
    let dir = std::env::temp_dir()
        .join(format!("stabiliser-workspace-{}", std::process::id()))
        .join("a/b");
    let created = ensure_out_dir(&dir).unwrap();
    assert!(created.is_dir());
    // second call is a no-op
    ensure_out_dir(&dir).unwrap();
    std::fs::remove_dir_all(dir.parent().unwrap().parent().unwrap()).unwrap();
}
