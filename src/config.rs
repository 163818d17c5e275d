//! `tablemap.toml` project configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TablemapConfig {
    /// SQLite database file the `apply` command writes to.
    pub database: Option<String>,
    /// Entity declaration file (`[[entity]]` tables).
    pub schema: Option<String>,
}

impl TablemapConfig {
    /// Starter configuration written by `tablemap init`.
    pub fn starter() -> Self {
        Self {
            database: Some(default_database_path().to_string_lossy().into_owned()),
            schema: Some("schema.toml".to_string()),
        }
    }

    /// Command-line value first, then the configured one.
    pub fn database_path(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.database.as_ref().map(PathBuf::from))
    }

    pub fn schema_path(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.schema.as_ref().map(PathBuf::from))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tablemap.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from(".tablemap").join("tablemap.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TablemapConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TablemapConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TablemapConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("tablemap.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tablemap.toml");
        let config = TablemapConfig::starter();

        write_config(&path, &config, false).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(config.clone()));

        // refuses to overwrite unless forced
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &TablemapConfig::default(), true).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(TablemapConfig::default()));
    }

    #[test]
    fn test_cli_value_wins() {
        let config = TablemapConfig {
            database: Some("app.db".to_string()),
            schema: None,
        };
        assert_eq!(config.database_path(None), Some(PathBuf::from("app.db")));
        assert_eq!(
            config.database_path(Some(PathBuf::from("other.db"))),
            Some(PathBuf::from("other.db"))
        );
        assert_eq!(config.schema_path(None), None);
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("deeper").join("app.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
        ensure_db_dir(Path::new("plain.db")).unwrap();
    }
}
