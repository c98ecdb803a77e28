//! Share-node client library
//!
//! Keeps a local peer's view of a directory-backed file-sharing network in
//! sync: identity and stats, the peer's own shared files, and directory
//! search results. Uploads, unshares and download redirects go through
//! controllers that re-derive cache state from the service afterwards.

pub mod cache;
pub mod config;
pub mod error;
pub mod library;
pub mod model;
pub mod node;
pub mod search;
pub mod sync;
pub mod transfer;
pub mod transport;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use node::{Intent, IntentOutcome, NodeClient};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "sharenode";

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        cache::{CacheUpdate, DirectoryCache},
        config::ClientConfig,
        error::{ClientError, Result},
        library::{Confirmation, UnshareOutcome},
        model::{Category, FileRecord, ListOrigin, PeerIdentity, SearchQuery, SortOrder},
        node::{Intent, IntentOutcome, NodeClient, RefreshReport},
        transfer::{Navigator, UploadSession, UploadState},
        transport::{HttpTransport, Transport, UploadPayload},
        view::{format_bytes, FileCard, FileDetails, IdentityPanel},
    };

    pub use tokio;
    pub use tracing::{debug, error, info, warn};
}
