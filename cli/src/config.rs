use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use nutrilog_core::Backend;

pub struct Config {
    pub data_dir: PathBuf,
    pub sqlite_path: PathBuf,
    pub kv_path: PathBuf,
}

impl Config {
    /// Resolve the data directory (the platform default unless `data_dir` is
    /// given) and make sure it exists.
    pub fn load(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = if let Some(dir) = data_dir {
            dir.to_path_buf()
        } else {
            let proj_dirs = ProjectDirs::from("", "", "nutrilog")
                .context("Could not determine home directory")?;
            proj_dirs.data_dir().to_path_buf()
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            sqlite_path: data_dir.join(Backend::Sqlite.file_name()),
            kv_path: data_dir.join(Backend::KeyValue.file_name()),
            data_dir,
        })
    }

    pub fn store_path(&self, backend: Backend) -> &Path {
        match backend {
            Backend::Sqlite => &self.sqlite_path,
            Backend::KeyValue => &self.kv_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("profile-a");
        let config = Config::load(Some(&dir)).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.data_dir, dir);
        assert_eq!(config.store_path(Backend::Sqlite), dir.join("nutrilog.db"));
        assert_eq!(config.store_path(Backend::KeyValue), dir.join("nutrilog.json"));
    }
}
