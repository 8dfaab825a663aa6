//! Configuration management for profcycle
//!
//! The application config holds the API consumer credentials shared by all
//! accounts, the service endpoints and the location of the accounts
//! directory. Per-account settings live in [`crate::accounts`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com/1.1/";
pub const DEFAULT_OAUTH_BASE_URL: &str = "https://api.twitter.com/oauth/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ACCOUNTS_DIR: &str = "accounts";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    /// Directory of the loaded config file
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_oauth_base_url")]
    pub oauth_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Accounts directory; relative paths are resolved against the
    /// directory holding the config file
    #[serde(default = "default_accounts_dir")]
    pub dir: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            dir: default_accounts_dir(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_oauth_base_url() -> String {
    DEFAULT_OAUTH_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_accounts_dir() -> String {
    DEFAULT_ACCOUNTS_DIR.to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// The file holds the consumer secret, so it is rejected when group or
    /// others can access it. A relative accounts directory is resolved
    /// against the directory holding the file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        check_private_permissions(path)?;

        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let mut config = Self::from_toml(&content)?;
        config.base_dir = Some(path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf());

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api.consumer_key.trim().is_empty() {
            return Err(ConfigError::MissingField("api.consumer_key".to_string()).into());
        }
        if self.api.consumer_secret.trim().is_empty() {
            return Err(ConfigError::MissingField("api.consumer_secret".to_string()).into());
        }
        Ok(())
    }

    pub fn accounts_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) => absolutize(base, &self.accounts.dir),
            None => PathBuf::from(shellexpand::tilde(&self.accounts.dir).as_ref()),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PROFCYCLE_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("profcycle").join("config.toml"))
}

/// Expand `~` and resolve a relative `path` against `base`
pub fn absolutize(base: &Path, path: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Reject files holding secrets that group or others can access
#[cfg(unix)]
pub fn check_private_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path).map_err(ConfigError::ReadError)?;
    let mode = metadata.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions {
            path: path.to_path_buf(),
            mode,
        }
        .into());
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn check_private_permissions(path: &Path) -> Result<()> {
    std::fs::metadata(path).map_err(ConfigError::ReadError)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfcycleError;
    use serial_test::serial;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[api]
consumer_key = "ck"
consumer_secret = "cs"
"#;

    fn write_private(path: &Path, content: &str) {
        std::fs::write(path, content).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).unwrap();
        }
    }

    #[test]
    fn test_from_toml_applies_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();

        assert_eq!(config.api.consumer_key, "ck");
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.oauth_url, DEFAULT_OAUTH_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.accounts.dir, "accounts");
    }

    #[test]
    fn test_from_toml_overrides() {
        let config = Config::from_toml(
            r#"
[api]
consumer_key = "ck"
consumer_secret = "cs"
base_url = "http://localhost:9000/1.1/"
timeout_secs = 5

[accounts]
dir = "/srv/profcycle/accounts"
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:9000/1.1/");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.accounts_dir(), PathBuf::from("/srv/profcycle/accounts"));
    }

    #[test]
    fn test_from_toml_missing_api_section() {
        let result = Config::from_toml("[accounts]\ndir = \"x\"\n");
        assert!(matches!(
            result,
            Err(ProfcycleError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_from_toml_blank_consumer_key() {
        let result = Config::from_toml("[api]\nconsumer_key = \"  \"\nconsumer_secret = \"cs\"\n");
        match result {
            Err(ProfcycleError::Config(ConfigError::MissingField(field))) => {
                assert_eq!(field, "api.consumer_key");
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_path_resolves_relative_accounts_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        write_private(&path, MINIMAL);

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.accounts_dir(), temp_dir.path().join("accounts"));
        assert_eq!(config.accounts.dir, "accounts");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_load_from_non_utf8_directory_keeps_accounts_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join(OsStr::from_bytes(b"conf\xff"));
        std::fs::create_dir(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        write_private(&path, MINIMAL);

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.accounts_dir(), config_dir.join("accounts"));
    }

    #[cfg(unix)]
    #[test]
    fn test_load_from_path_rejects_readable_by_others() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        match Config::load_from_path(&path) {
            Err(ProfcycleError::Config(ConfigError::InsecurePermissions { mode, .. })) => {
                assert_eq!(mode, 0o644);
            }
            other => panic!("Expected InsecurePermissions, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load_from_path(&temp_dir.path().join("absent.toml"));
        assert!(matches!(
            result,
            Err(ProfcycleError::Config(ConfigError::ReadError(_)))
        ));
    }

    #[test]
    fn test_absolutize() {
        let base = Path::new("/base");
        assert_eq!(absolutize(base, "icons"), PathBuf::from("/base/icons"));
        assert_eq!(absolutize(base, "/abs/icons"), PathBuf::from("/abs/icons"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_from_env() {
        std::env::set_var("PROFCYCLE_CONFIG", "/tmp/profcycle-test/config.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("PROFCYCLE_CONFIG");

        assert_eq!(path, PathBuf::from("/tmp/profcycle-test/config.toml"));
    }
}
