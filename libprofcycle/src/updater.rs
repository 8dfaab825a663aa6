//! Profile updates
//!
//! [`ProfileUpdater`] ties one account to a session: for each role it asks
//! the [`Selector`] for the next image of the role's pool, reads it and
//! uploads it. Icon and header pools keep separate rotation state, so
//! updating one never consumes a slot of the other.

use rand::rngs::ThreadRng;
use rand::Rng;
use std::path::PathBuf;

use crate::accounts::Account;
use crate::error::{ProfcycleError, Result, SelectionError};
use crate::platforms::ProfileSession;
use crate::strategy::Selector;
use crate::types::{ImageRole, TimelineEntry, UploadReceipt};

/// Outcome of updating several roles in one run
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub outcomes: Vec<(ImageRole, Result<UploadReceipt>)>,
}

impl UpdateReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, result)| result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (ImageRole, &ProfcycleError)> {
        self.outcomes
            .iter()
            .filter_map(|(role, result)| result.as_ref().err().map(|e| (*role, e)))
    }

    /// Exit code of the first failure, 0 when every role succeeded
    pub fn exit_code(&self) -> i32 {
        self.failures()
            .next()
            .map(|(_, e)| e.exit_code())
            .unwrap_or(0)
    }
}

pub struct ProfileUpdater<S, R = ThreadRng> {
    account: Account,
    session: S,
    selector: Selector<R>,
}

impl<S: ProfileSession> ProfileUpdater<S> {
    pub fn new(account: Account, session: S) -> Self {
        Self::with_selector(account, session, Selector::new())
    }
}

impl<S: ProfileSession, R: Rng> ProfileUpdater<S, R> {
    pub fn with_selector(account: Account, session: S, selector: Selector<R>) -> Self {
        Self {
            account,
            session,
            selector,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Select the next image for `role` without uploading it
    ///
    /// Consumes a rotation slot exactly like an update does.
    pub fn pick(&mut self, role: ImageRole) -> Result<PathBuf> {
        let source = self.account.require_profile()?.source(role);
        let name = self.selector.select_named(&source.dir, &source.strategy)?;
        Ok(source.dir.join(name))
    }

    /// Pick the next image for `role` and upload it
    pub async fn update_role(&mut self, role: ImageRole) -> Result<UploadReceipt> {
        let image = self.pick(role)?;
        let bytes = std::fs::read(&image).map_err(SelectionError::Io)?;

        tracing::debug!("Upload {} for the {} image", image.display(), role);
        let response = self.session.upload(role.endpoint(), &bytes).await?;
        tracing::info!(
            "Updated {} of '{}' with {}",
            role,
            self.account.name,
            image.display()
        );

        Ok(UploadReceipt {
            role,
            image,
            status: response.status,
            response: response.body,
        })
    }

    pub async fn update_icon(&mut self) -> Result<UploadReceipt> {
        self.update_role(ImageRole::Icon).await
    }

    pub async fn update_header(&mut self) -> Result<UploadReceipt> {
        self.update_role(ImageRole::Header).await
    }

    /// Update every role in `roles`, in order
    ///
    /// A failing role is logged and recorded; the remaining roles are still
    /// attempted.
    pub async fn update(&mut self, roles: &[ImageRole]) -> UpdateReport {
        let mut report = UpdateReport::default();
        for &role in roles {
            let result = self.update_role(role).await;
            if let Err(e) = &result {
                tracing::warn!("Failed to update {} of '{}': {}", role, self.account.name, e);
            }
            report.outcomes.push((role, result));
        }
        report
    }

    /// Most recent `count` entries of the account's home timeline
    pub async fn get_timeline(&self, count: u32) -> Result<Vec<TimelineEntry>> {
        self.account.require_profile()?;
        self.session.home_timeline(count).await
    }
}
