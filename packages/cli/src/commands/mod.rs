pub mod check;
pub mod init;
pub mod migrate;
pub mod publish;

pub use check::{check, CheckArgs};
pub use init::{init, InitArgs};
pub use migrate::{migrate, MigrateArgs};
pub use publish::{publish_check, PublishCheckArgs};

use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::{anyhow, Result};
use pagecraft_editor::{Pipeline, Registry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Pipeline configured from the project's editor settings
pub(crate) fn build_pipeline(config: &Config) -> Pipeline {
    Pipeline::new(Arc::new(Registry::builtin())).with_url_policy(config.editor.url_policy())
}

/// Resolve the documents a batch command runs over: an explicit file, every
/// document under an explicit directory, or the configured source directory
pub(crate) fn resolve_documents(
    input: Option<&Path>,
    config: &Config,
    cwd: &str,
) -> Result<Vec<PathBuf>> {
    let input = match input {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => PathBuf::from(cwd).join(path),
        None => config.get_src_dir(cwd),
    };

    if input.is_file() {
        Ok(vec![input])
    } else if input.is_dir() {
        Ok(find_documents(&input))
    } else {
        Err(anyhow!("Input path does not exist: {}", input.display()))
    }
}

fn find_documents(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|s| s.to_str()) == Some("json")
                && path.file_name().and_then(|s| s.to_str()) != Some(DEFAULT_CONFIG_NAME)
        })
        .collect();

    files.sort();
    files
}
