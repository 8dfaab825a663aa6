//! Per-account profile storage
//!
//! Each account owns a directory under the accounts directory, named after
//! the percent-encoded account name. It holds `account.toml` with the image
//! pools, their strategies and the OAuth access token. Relative image
//! directories are resolved against the account directory, so the default
//! layout is:
//!
//! ```text
//! accounts/
//!   alice/
//!     account.toml
//!     icons/
//!     headers/
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{absolutize, check_private_permissions};
use crate::error::{AccountError, Result};
use crate::platforms::oauth1::Token;
use crate::strategy::StrategyKind;
use crate::types::ImageRole;

pub const PROFILE_FILE_NAME: &str = "account.toml";

pub const DEFAULT_ICON_DIR: &str = "icons";
pub const DEFAULT_ICON_STRATEGY: StrategyKind = StrategyKind::Shuffle;
pub const DEFAULT_HEADER_DIR: &str = "headers";
pub const DEFAULT_HEADER_STRATEGY: StrategyKind = StrategyKind::Sequential;

/// On-disk form of `account.toml`
///
/// Strategies stay strings here and in [`ImageSource`]; an unknown name
/// surfaces as `UnknownStrategy` when that role is selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFile {
    #[serde(default = "default_icon_dir")]
    pub icon_dir: String,
    #[serde(default = "default_icon_strategy")]
    pub icon_strategy: String,
    #[serde(default = "default_header_dir")]
    pub header_dir: String,
    #[serde(default = "default_header_strategy")]
    pub header_strategy: String,
    pub access_token: String,
    pub access_token_secret: String,
}

fn default_icon_dir() -> String {
    DEFAULT_ICON_DIR.to_string()
}

fn default_icon_strategy() -> String {
    DEFAULT_ICON_STRATEGY.to_string()
}

fn default_header_dir() -> String {
    DEFAULT_HEADER_DIR.to_string()
}

fn default_header_strategy() -> String {
    DEFAULT_HEADER_STRATEGY.to_string()
}

impl ProfileFile {
    /// Default pools and strategies for a freshly authorized account
    pub fn default_for(access: &Token) -> Self {
        Self {
            icon_dir: default_icon_dir(),
            icon_strategy: default_icon_strategy(),
            header_dir: default_header_dir(),
            header_strategy: default_header_strategy(),
            access_token: access.key.clone(),
            access_token_secret: access.secret().to_string(),
        }
    }
}

/// Where one role draws its images from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub dir: PathBuf,
    /// Strategy name as configured, parsed on selection
    pub strategy: String,
}

impl ImageSource {
    pub fn kind(&self) -> Result<StrategyKind> {
        self.strategy.parse()
    }
}

/// Account profile with image directories resolved
#[derive(Debug)]
pub struct AccountProfile {
    pub icon: ImageSource,
    pub header: ImageSource,
    access: Token,
}

impl AccountProfile {
    /// Build a profile, resolving relative dirs against `account_dir`
    pub fn from_file(file: ProfileFile, account_dir: &Path) -> Self {
        Self {
            icon: ImageSource {
                dir: absolutize(account_dir, &file.icon_dir),
                strategy: file.icon_strategy,
            },
            header: ImageSource {
                dir: absolutize(account_dir, &file.header_dir),
                strategy: file.header_strategy,
            },
            access: Token::new(file.access_token, file.access_token_secret),
        }
    }

    pub fn source(&self, role: ImageRole) -> &ImageSource {
        match role {
            ImageRole::Icon => &self.icon,
            ImageRole::Header => &self.header,
        }
    }

    /// A fresh copy of the access token for building a session
    pub fn access_token(&self) -> Token {
        Token::new(self.access.key.clone(), self.access.secret().to_string())
    }
}

/// An account and its profile, if it has been initialized
#[derive(Debug)]
pub struct Account {
    pub name: String,
    pub dir: PathBuf,
    profile: Option<AccountProfile>,
}

impl Account {
    pub fn is_initialized(&self) -> bool {
        self.profile.is_some()
    }

    /// The profile, or `NotAuthorized` when the account was never initialized
    pub fn require_profile(&self) -> Result<&AccountProfile> {
        self.profile
            .as_ref()
            .ok_or_else(|| AccountError::NotAuthorized(self.name.clone()).into())
    }

    pub fn profile_path(&self) -> PathBuf {
        self.dir.join(PROFILE_FILE_NAME)
    }
}

/// Locates, loads and creates account profiles
#[derive(Debug, Clone)]
pub struct AccountStore {
    accounts_dir: PathBuf,
}

impl AccountStore {
    pub fn new(accounts_dir: impl Into<PathBuf>) -> Self {
        Self {
            accounts_dir: accounts_dir.into(),
        }
    }

    /// Validate account name format
    ///
    /// Rules:
    /// - Cannot be empty or whitespace only
    /// - Maximum 64 characters
    /// - No control characters
    pub fn validate_account_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(AccountError::InvalidName("Account name cannot be empty".to_string()).into());
        }

        if name.chars().count() > 64 {
            return Err(AccountError::InvalidName(format!(
                "Account name too long: {} characters (max 64)",
                name.chars().count()
            ))
            .into());
        }

        if name.chars().any(char::is_control) {
            return Err(AccountError::InvalidName(
                "Account name cannot contain control characters".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Directory of `name`; the name is percent-encoded so any handle maps
    /// to a single path component
    pub fn account_dir(&self, name: &str) -> PathBuf {
        self.accounts_dir.join(urlencoding::encode(name).as_ref())
    }

    /// Load an account; a missing profile yields an uninitialized account
    pub fn open(&self, name: &str) -> Result<Account> {
        Self::validate_account_name(name)?;

        let dir = self.account_dir(name);
        let profile_path = dir.join(PROFILE_FILE_NAME);

        let profile = if profile_path.exists() {
            check_private_permissions(&profile_path)?;
            let content = std::fs::read_to_string(&profile_path).map_err(AccountError::Io)?;
            let file: ProfileFile = toml::from_str(&content).map_err(AccountError::Parse)?;
            tracing::debug!("Loaded account profile {}", profile_path.display());
            Some(AccountProfile::from_file(file, &dir))
        } else {
            tracing::debug!("No account profile at {}", profile_path.display());
            None
        };

        Ok(Account {
            name: name.to_string(),
            dir,
            profile,
        })
    }

    /// Write the default profile for a newly authorized account
    ///
    /// Fails with `AlreadyInitialized` when a profile exists; the user has to
    /// remove it by hand to start over.
    pub fn initialize(&self, name: &str, access: &Token) -> Result<Account> {
        Self::validate_account_name(name)?;
        self.ensure_not_initialized(name)?;

        let dir = self.account_dir(name);
        std::fs::create_dir_all(&dir).map_err(AccountError::Io)?;

        let content = toml::to_string_pretty(&ProfileFile::default_for(access))
            .map_err(AccountError::Serialize)?;
        write_private(&dir.join(PROFILE_FILE_NAME), &content)?;

        tracing::info!("Initialized account '{}' in {}", name, dir.display());
        self.open(name)
    }

    /// Fail with `AlreadyInitialized` when `name` already has a profile
    pub fn ensure_not_initialized(&self, name: &str) -> Result<()> {
        let profile_path = self.account_dir(name).join(PROFILE_FILE_NAME);
        if profile_path.exists() {
            return Err(AccountError::AlreadyInitialized(profile_path).into());
        }
        Ok(())
    }
}

/// Write a file readable by its owner only
fn write_private(path: &Path, content: &str) -> Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(AccountError::Io)?;
    file.write_all(content.as_bytes()).map_err(AccountError::Io)?;
    Ok(())
}
