//! The client facade: owns the cache and the controllers, and routes user
//! intents to them.

use crate::cache::DirectoryCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::library::{Confirmation, LibraryController, UnshareOutcome};
use crate::model::{ListOrigin, SearchQuery};
use crate::search::{SearchController, SearchOutcome};
use crate::sync::Refresher;
use crate::transfer::{Navigator, TransferController, UploadSession};
use crate::transport::{Transport, UploadPayload};
use crate::view::{FileCard, FileDetails, IdentityPanel};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Something the user asked for
#[derive(Debug, Clone)]
pub enum Intent {
    Refresh,
    SearchSubmitted(SearchQuery),
    UploadDropped(UploadPayload),
    UnshareClicked { file_id: String },
    DownloadClicked { file_id: String },
    ShareLinkRequested { file_id: String },
    InfoRequested { file_id: String, origin: ListOrigin },
}

#[derive(Debug, Clone)]
pub enum IntentOutcome {
    Refreshed(RefreshReport),
    Searched(SearchOutcome),
    Uploaded(UploadSession),
    Unshared(UnshareOutcome),
    DownloadDispatched(Url),
    ShareLink(Url),
    Details(Option<FileDetails>),
}

/// Result of a combined refresh; failures are already logged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub online: bool,
    pub local_files: Option<usize>,
    pub search: Option<SearchOutcome>,
}

pub struct NodeClient<T> {
    cache: Arc<DirectoryCache>,
    refresher: Arc<Refresher<T>>,
    search: SearchController<T>,
    transfer: TransferController<T>,
    library: LibraryController<T>,
}

impl<T: Transport> NodeClient<T> {
    pub fn new(
        transport: Arc<T>,
        navigator: Arc<dyn Navigator>,
        confirmation: Arc<dyn Confirmation>,
        config: &ClientConfig,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(DirectoryCache::new());
        let refresher = Arc::new(Refresher::new(transport.clone(), cache.clone()));

        Ok(Self {
            search: SearchController::new(transport.clone(), cache.clone()),
            transfer: TransferController::new(
                transport.clone(),
                refresher.clone(),
                navigator,
                config,
            )?,
            library: LibraryController::new(transport, refresher.clone(), confirmation),
            refresher,
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<DirectoryCache> {
        &self.cache
    }

    pub fn transfer(&self) -> &TransferController<T> {
        &self.transfer
    }

    /// Populate everything at once: identity, local files and the full
    /// directory. One failing never holds back the others.
    pub async fn start(&self) -> RefreshReport {
        info!("Starting share-node client");
        let (identity, local, search) = tokio::join!(
            self.refresher.refresh_identity(),
            self.refresher.refresh_local_files(),
            self.search.initial(),
        );

        if let Err(e) = &search {
            error!("Initial search failed: {}", e);
        }
        let report = RefreshReport {
            online: identity.is_ok() && self.cache.is_online(),
            local_files: local.ok(),
            search: search.ok(),
        };
        info!(
            "Startup complete: online={} local_files={:?}",
            report.online, report.local_files
        );
        report
    }

    /// Identity and local files, concurrently
    pub async fn refresh(&self) -> RefreshReport {
        let (identity, local) = tokio::join!(
            self.refresher.refresh_identity(),
            self.refresher.refresh_local_files(),
        );
        RefreshReport {
            online: identity.is_ok() && self.cache.is_online(),
            local_files: local.ok(),
            search: None,
        }
    }

    pub async fn dispatch(&self, intent: Intent) -> Result<IntentOutcome> {
        let outcome = match intent {
            Intent::Refresh => IntentOutcome::Refreshed(self.refresh().await),
            Intent::SearchSubmitted(query) => {
                IntentOutcome::Searched(self.search.submit(query).await?)
            }
            Intent::UploadDropped(payload) => {
                IntentOutcome::Uploaded(self.transfer.upload(payload).await?)
            }
            Intent::UnshareClicked { file_id } => {
                IntentOutcome::Unshared(self.library.unshare(&file_id).await?)
            }
            Intent::DownloadClicked { file_id } => {
                IntentOutcome::DownloadDispatched(self.transfer.initiate_download(&file_id)?)
            }
            Intent::ShareLinkRequested { file_id } => {
                IntentOutcome::ShareLink(self.transfer.share_link(&file_id)?)
            }
            Intent::InfoRequested { file_id, origin } => {
                IntentOutcome::Details(self.file_details(&file_id, origin))
            }
        };
        Ok(outcome)
    }

    /// Look a file up in one snapshot; lists are never merged
    pub fn file_details(&self, file_id: &str, origin: ListOrigin) -> Option<FileDetails> {
        let record = match origin {
            ListOrigin::Local => self.cache.find_local(file_id),
            ListOrigin::Network => self.cache.find_search_result(file_id),
        };
        match record {
            Some(record) => Some(FileDetails::project(&record, origin)),
            None => {
                warn!("File {} not found in {:?} list", file_id, origin);
                None
            }
        }
    }

    pub fn identity_panel(&self) -> IdentityPanel {
        IdentityPanel::project(self.cache.identity().as_deref())
    }

    pub fn local_cards(&self) -> Vec<FileCard> {
        FileCard::project_all(&self.cache.local_files(), ListOrigin::Local)
    }

    pub fn network_cards(&self) -> Vec<FileCard> {
        FileCard::project_all(&self.cache.search_results(), ListOrigin::Network)
    }
}
