//! Core types shared across profcycle

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which profile image a pool feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    Icon,
    Header,
}

impl ImageRole {
    pub fn endpoint(&self) -> ProfileEndpoint {
        match self {
            ImageRole::Icon => ProfileEndpoint::ProfileImage,
            ImageRole::Header => ProfileEndpoint::ProfileBanner,
        }
    }
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Icon => f.write_str("icon"),
            ImageRole::Header => f.write_str("header"),
        }
    }
}

/// Remote endpoints accepting profile images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileEndpoint {
    ProfileImage,
    ProfileBanner,
}

impl ProfileEndpoint {
    /// Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            ProfileEndpoint::ProfileImage => "account/update_profile_image.json",
            ProfileEndpoint::ProfileBanner => "account/update_profile_banner.json",
        }
    }

    /// Form field carrying the base64 image
    pub fn field(&self) -> &'static str {
        match self {
            ProfileEndpoint::ProfileImage => "image",
            ProfileEndpoint::ProfileBanner => "banner",
        }
    }
}

impl fmt::Display for ProfileEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileEndpoint::ProfileImage => f.write_str("profile_image"),
            ProfileEndpoint::ProfileBanner => f.write_str("profile_banner"),
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub role: ImageRole,
    pub image: PathBuf,
    pub status: u16,
    /// Response body; the banner endpoint answers with an empty body
    pub response: Option<serde_json::Value>,
}

/// One post of the home timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub author: String,
    pub text: String,
}

impl fmt::Display for TimelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.author, self.text)
    }
}
