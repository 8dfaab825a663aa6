//! profcycle - rotate profile icons and headers from local image pools
//!
//! On every run the next image is chosen from a directory according to a
//! strategy (random, sequential or shuffle) and uploaded to the account's
//! profile. Preordered strategies remember the rest of the current cycle in
//! a small file next to the images, so no image repeats until every image
//! of the pool has been used.

pub mod accounts;
pub mod config;
pub mod error;
pub mod logging;
pub mod platforms;
pub mod pool;
pub mod rotation;
pub mod strategy;
pub mod types;
pub mod updater;

// Re-export commonly used types
pub use accounts::{Account, AccountProfile, AccountStore};
pub use config::Config;
pub use error::{ProfcycleError, Result};
pub use strategy::{Selector, StrategyKind};
pub use types::{ImageRole, ProfileEndpoint, TimelineEntry, UploadReceipt};
pub use updater::{ProfileUpdater, UpdateReport};
