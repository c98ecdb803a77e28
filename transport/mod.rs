//! Transport adapter seam between the controllers and the remote service.

pub mod http;

use crate::error::Result;
use crate::model::{FileRecord, PeerIdentity, SearchQuery};
use std::future::Future;
use std::sync::Arc;

pub use http::HttpTransport;

/// Progress callback for uploads: `(bytes_sent, bytes_total)`
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// A file selected for sharing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadPayload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Request/response calls against the peer API.
///
/// Every call maps to exactly one endpoint. Implementations report
/// failures through the `ClientError` taxonomy and never retry.
pub trait Transport: Send + Sync + 'static {
    /// `GET /api/v1/info`
    fn fetch_identity(&self) -> impl Future<Output = Result<PeerIdentity>> + Send;

    /// `GET /api/v1/files`
    fn fetch_local_files(&self) -> impl Future<Output = Result<Vec<FileRecord>>> + Send;

    /// `GET /api/v1/search?q=..&category=..`
    fn search(&self, query: &SearchQuery) -> impl Future<Output = Result<Vec<FileRecord>>> + Send;

    /// `POST /api/v1/files/share`, multipart field `file`.
    ///
    /// `progress` receives non-decreasing byte counts; the returned
    /// future resolves once with the terminal outcome.
    fn share_file(
        &self,
        payload: UploadPayload,
        progress: ProgressCallback,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `DELETE /api/v1/files/unshare/<id>`
    fn unshare_file(&self, file_id: &str) -> impl Future<Output = Result<()>> + Send;
}
