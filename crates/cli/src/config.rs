use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "kharcha.toml";
const DATABASE_FILE: &str = "kharcha.db";

/// Contents of `kharcha.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// sqlite database path.
    pub database: Option<PathBuf>,
    /// Bank registry TOML replacing the built-in profiles.
    pub banks: Option<PathBuf>,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid kharcha.toml")
    }

    /// Read `path` if given, otherwise `kharcha.toml` in `data_dir`.
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>, data_dir: &Path) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (data_dir.join(CONFIG_FILE), false),
        };

        if !explicit && !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::from_toml(&content)?;

        // Relative paths are relative to the config file.
        if let Some(base) = path.parent() {
            config.database = config.database.map(|p| base.join(p));
            config.banks = config.banks.map(|p| base.join(p));
        }
        Ok(config)
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| data_dir.join(DATABASE_FILE))
    }
}

/// Platform data directory, e.g. `~/.local/share/kharcha` on Linux.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("in", "kharcha", "Kharcha")
        .context("could not determine a home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(Config::from_toml("databse = \"x.db\"").is_err());
    }

    #[test]
    fn missing_default_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database_path(dir.path()), dir.path().join("kharcha.db"));
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml")), dir.path()).is_err());
    }

    #[test]
    fn relative_paths_follow_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "database = \"ledger.db\"\nbanks = \"banks.toml\"\n").unwrap();

        let config = Config::load(Some(&path), Path::new("/unused")).unwrap();
        assert_eq!(config.database, Some(dir.path().join("ledger.db")));
        assert_eq!(config.banks, Some(dir.path().join("banks.toml")));
        assert_eq!(config.database_path(Path::new("/unused")), dir.path().join("ledger.db"));
    }
}
