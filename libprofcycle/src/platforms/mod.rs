//! Remote profile service abstraction
//!
//! The updater only needs two capabilities from the remote side: upload an
//! image to one of the profile endpoints, and read the home timeline to check
//! that the account works. [`ProfileSession`] captures both so the selection
//! path can be exercised against [`mock::MockSession`] in tests.
//!
//! # Example
//!
//! ```no_run
//! use libprofcycle::config::Config;
//! use libprofcycle::platforms::{ProfileSession, oauth1::Token, twitter::TwitterSession};
//! use libprofcycle::types::ProfileEndpoint;
//!
//! # async fn example() -> libprofcycle::Result<()> {
//! let config = Config::load()?;
//! let session = TwitterSession::authorized(&config.api, Token::new("token", "secret"))?;
//!
//! let bytes = std::fs::read("/home/me/icons/cat.png")
//!     .map_err(libprofcycle::error::SelectionError::Io)?;
//! let receipt = session.upload(ProfileEndpoint::ProfileImage, &bytes).await?;
//! println!("Uploaded with status {}", receipt.status);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ProfileEndpoint, TimelineEntry};

pub mod mock;
pub mod oauth1;
pub mod twitter;

/// Response of a successful profile upload
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

/// Authorized session against the profile service
#[async_trait]
pub trait ProfileSession: Send + Sync {
    /// Upload raw image bytes to a profile endpoint
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::UploadFailed` with the status code and body
    /// for non-2xx responses, or `PlatformError::Network` when the request
    /// cannot be sent.
    async fn upload(&self, endpoint: ProfileEndpoint, image: &[u8]) -> Result<UploadResponse>;

    /// Fetch the most recent `count` entries of the home timeline
    async fn home_timeline(&self, count: u32) -> Result<Vec<TimelineEntry>>;

    /// Short service name for logs
    fn name(&self) -> &str;
}
