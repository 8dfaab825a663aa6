//! Mock session implementation for testing
//!
//! Records every upload and can be told to fail for one endpoint or for all
//! of them. Available in all builds so integration tests can drive the
//! updater without credentials or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::{ProfileSession, UploadResponse};
use crate::types::{ProfileEndpoint, TimelineEntry};

/// An upload captured by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub endpoint: ProfileEndpoint,
    pub image: Vec<u8>,
}

/// Configuration for mock session behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Endpoints that answer with `failure_status`; `None` fails every upload
    pub failing_endpoints: Option<Vec<ProfileEndpoint>>,

    /// Status code returned for failing uploads
    pub failure_status: u16,

    /// Body returned for failing uploads
    pub failure_body: String,

    /// Entries served by `home_timeline`
    pub timeline: Vec<TimelineEntry>,

    /// Uploads that have been made (for verification)
    pub uploads: Arc<Mutex<Vec<RecordedUpload>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            failing_endpoints: Some(Vec::new()),
            failure_status: 500,
            failure_body: "Mock upload failed".to_string(),
            timeline: Vec::new(),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock session for testing
pub struct MockSession {
    config: MockConfig,
}

impl MockSession {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock session where every call succeeds
    pub fn success() -> Self {
        Self::new(MockConfig::default())
    }

    /// Create a mock session where every upload fails with `status`
    pub fn upload_failure(status: u16, body: &str) -> Self {
        Self::new(MockConfig {
            failing_endpoints: None,
            failure_status: status,
            failure_body: body.to_string(),
            ..Default::default()
        })
    }

    /// Create a mock session where uploads to `endpoint` fail
    pub fn failing_endpoint(endpoint: ProfileEndpoint) -> Self {
        Self::new(MockConfig {
            failing_endpoints: Some(vec![endpoint]),
            ..Default::default()
        })
    }

    /// Create a mock session serving a fixed timeline
    pub fn with_timeline(timeline: Vec<TimelineEntry>) -> Self {
        Self::new(MockConfig {
            timeline,
            ..Default::default()
        })
    }

    /// Handle on the recorded uploads that survives moving the session
    pub fn uploads_handle(&self) -> Arc<Mutex<Vec<RecordedUpload>>> {
        Arc::clone(&self.config.uploads)
    }

    /// All uploads made so far
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.config.uploads.lock().unwrap().clone()
    }

    fn fails(&self, endpoint: ProfileEndpoint) -> bool {
        match &self.config.failing_endpoints {
            None => true,
            Some(endpoints) => endpoints.contains(&endpoint),
        }
    }
}

#[async_trait]
impl ProfileSession for MockSession {
    async fn upload(&self, endpoint: ProfileEndpoint, image: &[u8]) -> Result<UploadResponse> {
        if self.fails(endpoint) {
            return Err(PlatformError::UploadFailed {
                status: self.config.failure_status,
                body: self.config.failure_body.clone(),
            }
            .into());
        }

        self.config.uploads.lock().unwrap().push(RecordedUpload {
            endpoint,
            image: image.to_vec(),
        });

        Ok(UploadResponse {
            status: 200,
            body: Some(serde_json::json!({ "endpoint": endpoint.to_string() })),
        })
    }

    async fn home_timeline(&self, count: u32) -> Result<Vec<TimelineEntry>> {
        Ok(self
            .config
            .timeline
            .iter()
            .take(count as usize)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
