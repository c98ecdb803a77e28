//! HTTP implementation of the transport adapter (reqwest)

use super::{ProgressCallback, Transport, UploadPayload};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::model::{FileRecord, PeerIdentity, SearchQuery, SearchResponse};
use futures::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use tracing::debug;
use url::Url;

/// API prefix shared by every peer endpoint
const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Transport adapter talking to the peer's HTTP API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
    chunk_size: usize,
}

impl HttpTransport {
    /// Build a transport from validated configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("sharenode/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: config.api_url()?,
            chunk_size: config.transfer.chunk_size.max(1),
        })
    }

    /// `<base>/api/v1/<segments..>`; each segment is percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::Config(format!("{} cannot be a base URL", self.base)))?;
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        Ok(url)
    }

    /// Search URL with percent-encoded text and category
    pub fn search_url(&self, query: &SearchQuery) -> Result<Url> {
        let mut url = self.endpoint(&["search"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", &query.text)
                .append_pair("category", query.category.as_param());
            if let Some(sort) = query.sort {
                pairs.append_pair("sort", sort.as_param());
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    /// Map a non-success status to the error taxonomy
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match body.trim() {
            "" => status.canonical_reason().unwrap_or("request failed").to_string(),
            text => text.to_string(),
        };
        Err(ClientError::from_status(status.as_u16(), message))
    }
}

impl Transport for HttpTransport {
    async fn fetch_identity(&self) -> Result<PeerIdentity> {
        let url = self.endpoint(&["info"])?;
        debug!("GET {}", url);
        let response = Self::check(self.client.get(url).send().await?).await?;
        Ok(response.json::<PeerIdentity>().await?)
    }

    async fn fetch_local_files(&self) -> Result<Vec<FileRecord>> {
        let url = self.endpoint(&["files"])?;
        debug!("GET {}", url);
        let response = Self::check(self.client.get(url).send().await?).await?;
        // the peer encodes an empty list as null
        let files = response.json::<Option<Vec<FileRecord>>>().await?;
        Ok(files.unwrap_or_default())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<FileRecord>> {
        let url = self.search_url(query)?;
        debug!("GET {}", url);
        let response = Self::check(self.client.get(url).send().await?).await?;
        Ok(response.json::<SearchResponse>().await?.results)
    }

    async fn share_file(&self, payload: UploadPayload, progress: ProgressCallback) -> Result<()> {
        let url = self.endpoint(&["files", "share"])?;
        let total = payload.len();
        let UploadPayload { filename, bytes } = payload;
        debug!("POST {} ({} bytes)", url, total);

        progress(0, total);

        let chunks: Vec<Vec<u8>> = bytes.chunks(self.chunk_size).map(<[u8]>::to_vec).collect();
        let mut sent = 0u64;
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            progress(sent, total);
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(filename)
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        Self::check(self.client.post(url).multipart(form).send().await?).await?;
        Ok(())
    }

    async fn unshare_file(&self, file_id: &str) -> Result<()> {
        let url = self.endpoint(&["files", "unshare", file_id])?;
        debug!("DELETE {}", url);
        Self::check(self.client.delete(url).send().await?).await?;
        Ok(())
    }
}
