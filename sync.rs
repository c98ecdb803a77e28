//! Identity and local-files refresh shared by the controllers.

use crate::cache::DirectoryCache;
use crate::error::Result;
use crate::transport::Transport;
use std::sync::Arc;
use tracing::{debug, warn};

/// Re-derives cache contents from the authoritative service
pub struct Refresher<T> {
    transport: Arc<T>,
    cache: Arc<DirectoryCache>,
}

impl<T: Transport> Refresher<T> {
    pub fn new(transport: Arc<T>, cache: Arc<DirectoryCache>) -> Self {
        Self { transport, cache }
    }

    /// Fetch identity and stats. On failure the online indicator is forced
    /// off regardless of what was cached before.
    pub async fn refresh_identity(&self) -> Result<()> {
        match self.transport.fetch_identity().await {
            Ok(identity) => {
                debug!(
                    "Identity {} ({})",
                    identity.id,
                    if identity.is_online() { "online" } else { "offline" }
                );
                self.cache.replace_identity(identity);
                Ok(())
            }
            Err(e) => {
                warn!("Error fetching peer info: {}", e);
                self.cache.mark_offline();
                Err(e)
            }
        }
    }

    /// Replace the local-files list. On failure the last-known-good list
    /// stays in place.
    pub async fn refresh_local_files(&self) -> Result<usize> {
        match self.transport.fetch_local_files().await {
            Ok(files) => {
                let count = files.len();
                self.cache.replace_local_files(files);
                Ok(count)
            }
            Err(e) => {
                warn!("Error fetching shared files: {}", e);
                Err(e)
            }
        }
    }
}
