//! Mutation controller: unsharing local files.

use crate::error::Result;
use crate::sync::Refresher;
use crate::transport::Transport;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Asks the user before a destructive action
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnshareOutcome {
    /// The user said no; nothing was sent
    Declined,
    /// The service confirmed the removal
    Removed,
}

pub struct LibraryController<T> {
    transport: Arc<T>,
    refresher: Arc<Refresher<T>>,
    confirmation: Arc<dyn Confirmation>,
}

impl<T: Transport> LibraryController<T> {
    pub fn new(
        transport: Arc<T>,
        refresher: Arc<Refresher<T>>,
        confirmation: Arc<dyn Confirmation>,
    ) -> Self {
        Self {
            transport,
            refresher,
            confirmation,
        }
    }

    /// Stop sharing a file after explicit confirmation.
    ///
    /// On success the local list is re-fetched rather than filtered, so
    /// concurrent server-side changes show up too. On failure the cache is
    /// untouched and the error is returned; there is no retry.
    pub async fn unshare(&self, file_id: &str) -> Result<UnshareOutcome> {
        if !self
            .confirmation
            .confirm("Are you sure you want to unshare this file?")
        {
            info!("Unshare of {} declined", file_id);
            return Ok(UnshareOutcome::Declined);
        }

        if let Err(e) = self.transport.unshare_file(file_id).await {
            error!("Failed to unshare file {}: {}", file_id, e);
            return Err(e);
        }
        info!("File {} unshared successfully", file_id);

        if let Err(e) = self.refresher.refresh_local_files().await {
            warn!("Shared files not refreshed after unshare: {}", e);
        }
        Ok(UnshareOutcome::Removed)
    }
}
