//! Error types for profcycle

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfcycleError>;

#[derive(Error, Debug)]
pub enum ProfcycleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Image selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl ProfcycleError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ProfcycleError::Account(AccountError::NotAuthorized(_)) => 2,
            ProfcycleError::Platform(PlatformError::Authentication(_)) => 2,
            ProfcycleError::Platform(PlatformError::UploadFailed { status, .. })
            | ProfcycleError::Platform(PlatformError::RequestFailed { status, .. })
                if *status == 401 || *status == 403 =>
            {
                2
            }
            ProfcycleError::Selection(SelectionError::UnknownStrategy(_)) => 3,
            ProfcycleError::Account(AccountError::InvalidName(_)) => 3,
            _ => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error(
        "Config file {} should not be accessible to group or others (mode {mode:o}). Run: chmod 600 {}",
        .path.display(),
        .path.display()
    )]
    InsecurePermissions { path: PathBuf, mode: u32 },
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Account '{0}' is not authorized yet. Run 'prof-cycle init {0}' first")]
    NotAuthorized(String),

    #[error("Account is already initialized. Remove {} and retry", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Invalid account name: {0}")]
    InvalidName(String),

    #[error("Failed to access account profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse account profile: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize account profile: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Image directory {} does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("No image files are found in {}", .0.display())]
    EmptyPool(PathBuf),

    #[error("Unknown image strategy '{0}'. Valid options: random, sequential, shuffle")]
    UnknownStrategy(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Upload failed with status {status}: {body}")]
    UploadFailed { status: u16, body: String },

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}
