//! Transfer controller: the single active upload session and download
//! redirection through the directory service.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::sync::Refresher;
use crate::transport::{ProgressCallback, Transport, UploadPayload};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Upload lifecycle: Idle -> InProgress -> Completed | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    InProgress,
    Completed,
    Failed,
}

/// Progress information for the active upload
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: Uuid,
    pub filename: String,
    pub bytes_sent: u64,
    pub bytes_total: u64,
    pub state: UploadState,
    /// Set only when `state` is `Failed`
    pub failure_reason: Option<String>,
    pub started_at: Instant,
}

impl UploadSession {
    pub fn new(payload: &UploadPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: payload.filename.clone(),
            bytes_sent: 0,
            bytes_total: payload.len(),
            state: UploadState::Idle,
            failure_reason: None,
            started_at: Instant::now(),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.state == UploadState::InProgress
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, UploadState::Completed | UploadState::Failed)
    }

    /// Fraction sent, in [0, 1]
    pub fn fraction(&self) -> f64 {
        if self.bytes_total > 0 {
            (self.bytes_sent as f64 / self.bytes_total as f64).clamp(0.0, 1.0)
        } else if self.state == UploadState::Completed {
            1.0
        } else {
            0.0
        }
    }

    pub fn percentage(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Calculate transfer speed in bytes per second
    pub fn speed_bps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.bytes_sent as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get human-readable status
    pub fn status_string(&self) -> String {
        match self.state {
            UploadState::Idle => "Waiting".to_string(),
            UploadState::InProgress => format!("Uploading... {:.2}%", self.percentage()),
            UploadState::Completed => "Upload Complete!".to_string(),
            UploadState::Failed => format!(
                "Upload Failed: {}",
                self.failure_reason.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    fn begin(&mut self) {
        self.state = UploadState::InProgress;
        self.started_at = Instant::now();
    }

    /// Apply a progress report. Regressions are adapter noise and ignored.
    fn record_progress(&mut self, sent: u64, total: u64) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        if total > 0 {
            self.bytes_total = total;
        }
        let sent = sent.min(self.bytes_total);
        if sent < self.bytes_sent {
            debug!(
                "Ignoring progress regression for {}: {} < {}",
                self.filename, sent, self.bytes_sent
            );
            return false;
        }
        let changed = sent != self.bytes_sent;
        self.bytes_sent = sent;
        changed
    }

    fn complete(&mut self) {
        self.state = UploadState::Completed;
        self.bytes_sent = self.bytes_total;
    }

    fn fail(&mut self, reason: String) {
        self.state = UploadState::Failed;
        self.failure_reason = Some(reason);
    }
}

/// Dispatches a URL to whatever opens it (browser, terminal, ...)
pub trait Navigator: Send + Sync {
    fn open(&self, url: &Url) -> Result<()>;
}

impl<F> Navigator for F
where
    F: Fn(&Url) -> Result<()> + Send + Sync,
{
    fn open(&self, url: &Url) -> Result<()> {
        self(url)
    }
}

pub struct TransferController<T> {
    transport: Arc<T>,
    refresher: Arc<Refresher<T>>,
    navigator: Arc<dyn Navigator>,
    directory: Url,
    display_window: Duration,
    max_upload_size: u64,
    session: Arc<watch::Sender<Option<UploadSession>>>,
}

impl<T: Transport> TransferController<T> {
    pub fn new(
        transport: Arc<T>,
        refresher: Arc<Refresher<T>>,
        navigator: Arc<dyn Navigator>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let (session, _) = watch::channel(None);
        Ok(Self {
            transport,
            refresher,
            navigator,
            directory: config.directory_url()?,
            display_window: config.display_window(),
            max_upload_size: config.transfer.max_upload_size,
            session: Arc::new(session),
        })
    }

    /// Snapshot of the session, if one is active or still on display
    pub fn current(&self) -> Option<UploadSession> {
        self.session.borrow().clone()
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<Option<UploadSession>> {
        self.session.subscribe()
    }

    /// Upload a file. Fails fast with `SessionBusy` while another upload
    /// is in progress; runs to completion or transport failure otherwise.
    pub async fn upload(&self, payload: UploadPayload) -> Result<UploadSession> {
        let started = self.begin(&payload)?;
        let id = started.id;
        let _guard = CancelOnDrop {
            session: self.session.clone(),
            id,
            window: self.display_window,
        };
        info!("Uploading {} ({} bytes)", started.filename, payload.len());

        let tracker = self.session.clone();
        let progress: ProgressCallback = Arc::new(move |sent, total| {
            tracker.send_if_modified(|current| match current {
                Some(session) if session.id == id => session.record_progress(sent, total),
                _ => false,
            });
        });

        match self.transport.share_file(payload, progress).await {
            Ok(()) => {
                let session = self.finish(&started, UploadSession::complete);
                info!("Upload complete: {}", session.filename);

                // the service assigns the final id and metadata
                if let Err(e) = self.refresher.refresh_local_files().await {
                    warn!("Shared files not refreshed after upload: {}", e);
                }
                Ok(session)
            }
            Err(e) => {
                let reason = e.to_string();
                self.finish(&started, |s| s.fail(reason.clone()));
                warn!("Upload failed: {}: {}", started.filename, e);
                Err(e)
            }
        }
    }

    fn begin(&self, payload: &UploadPayload) -> Result<UploadSession> {
        let mut session = UploadSession::new(payload);
        session.begin();
        let started = session.clone();
        let mut busy_with = None;

        self.session.send_if_modified(|current| {
            if let Some(active) = current.as_ref().filter(|s| s.is_in_progress()) {
                busy_with = Some(active.filename.clone());
                return false;
            }
            *current = Some(session);
            true
        });

        if let Some(filename) = busy_with {
            warn!("Rejecting upload of {}: {} is still uploading", payload.filename, filename);
            return Err(ClientError::SessionBusy { filename });
        }

        // busy takes precedence over size
        if payload.len() > self.max_upload_size {
            self.finish(&started, |s| s.fail("file too large".to_string()));
            return Err(ClientError::FileTooLarge {
                size: payload.len(),
                max_size: self.max_upload_size,
            });
        }

        Ok(started)
    }

    /// Move the session to a terminal state and start its display window
    fn finish(&self, started: &UploadSession, apply: impl Fn(&mut UploadSession)) -> UploadSession {
        let mut finished = None;
        self.session.send_if_modified(|current| match current {
            Some(session) if session.id == started.id => {
                apply(session);
                finished = Some(session.clone());
                true
            }
            _ => false,
        });
        schedule_discard(self.session.clone(), started.id, self.display_window);

        finished.unwrap_or_else(|| {
            let mut session = started.clone();
            apply(&mut session);
            session
        })
    }

    /// `<directory>/download/<id>`; the directory redirects to the owner
    pub fn download_url(&self, file_id: &str) -> Result<Url> {
        if file_id.trim().is_empty() {
            return Err(ClientError::Navigation("empty file id".to_string()));
        }
        let mut url = self.directory.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("{} cannot be a base URL", self.directory)))?
            .pop_if_empty()
            .push("download")
            .push(file_id);
        Ok(url)
    }

    /// Dispatch the redirect URL once. No transfer, retry or progress here.
    pub fn initiate_download(&self, file_id: &str) -> Result<Url> {
        let url = self.download_url(file_id)?;
        self.navigator.open(&url)?;
        info!("Download of {} dispatched via {}", file_id, url);
        Ok(url)
    }

    /// Same URL as a download, returned instead of dispatched
    pub fn share_link(&self, file_id: &str) -> Result<Url> {
        self.download_url(file_id)
    }
}

/// Drop the session after the display window unless a newer one took over
fn schedule_discard(
    session: Arc<watch::Sender<Option<UploadSession>>>,
    id: Uuid,
    window: Duration,
) {
    let discard = move |current: &mut Option<UploadSession>| {
        if current.as_ref().map(|s| s.id) == Some(id) {
            *current = None;
            true
        } else {
            false
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(window).await;
                session.send_if_modified(discard);
            });
        }
        // runtime already gone, nothing left to display it
        Err(_) => {
            session.send_if_modified(discard);
        }
    }
}

/// Fails a session whose upload future was dropped mid-flight
struct CancelOnDrop {
    session: Arc<watch::Sender<Option<UploadSession>>>,
    id: Uuid,
    window: Duration,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let id = self.id;
        let cancelled = self.session.send_if_modified(|current| match current {
            Some(session) if session.id == id && session.is_in_progress() => {
                session.fail("upload cancelled".to_string());
                true
            }
            _ => false,
        });
        if cancelled {
            warn!("Upload {} cancelled before completion", id);
            schedule_discard(self.session.clone(), id, self.window);
        }
    }
}
