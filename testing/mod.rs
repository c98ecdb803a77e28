//! Test utilities: a scriptable in-memory transport and record builders.

mod scenarios;

use crate::error::{ClientError, Result};
use crate::model::{Category, FileRecord, PeerIdentity, SearchQuery};
use crate::transfer::UploadSession;
use crate::transport::{ProgressCallback, Transport, UploadPayload};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

/// A file record with the given id and name
pub fn record(id: &str, filename: &str) -> FileRecord {
    FileRecord::new(id, filename, 1000)
}

pub fn record_in(id: &str, filename: &str, category: Category) -> FileRecord {
    record(id, filename).with_category(category)
}

pub fn identity(registered: bool) -> PeerIdentity {
    PeerIdentity {
        id: "peer_0123456789ab".to_string(),
        address: "127.0.0.1".to_string(),
        port: 9001,
        is_registered: registered,
        shared_file_count: 2,
        ..Default::default()
    }
}

/// Calls observed by the mock, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Identity,
    LocalFiles,
    Search(String),
    Share(String),
    Unshare(String),
}

/// How the next upload ends
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    Succeed,
    Status(u16, String),
    Disconnect,
}

/// In-memory stand-in for the peer API
pub struct MockTransport {
    identity: Mutex<Option<PeerIdentity>>,
    local_files: Mutex<Option<Vec<FileRecord>>>,
    directory: Mutex<Option<Vec<FileRecord>>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    unshare_failure: Mutex<Option<u16>>,
    progress_points: Mutex<Vec<u64>>,
    upload_outcome: Mutex<UploadOutcome>,
    upload_gate: Mutex<Option<oneshot::Receiver<()>>>,
    session_probe: Mutex<Option<watch::Receiver<Option<UploadSession>>>>,
    observed_progress: Mutex<Vec<u64>>,
    calls: Mutex<Vec<Call>>,
    share_count: AtomicUsize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            identity: Mutex::new(Some(identity(true))),
            local_files: Mutex::new(Some(Vec::new())),
            directory: Mutex::new(Some(Vec::new())),
            search_delays: Mutex::new(HashMap::new()),
            unshare_failure: Mutex::new(None),
            progress_points: Mutex::new(Vec::new()),
            upload_outcome: Mutex::new(UploadOutcome::Succeed),
            upload_gate: Mutex::new(None),
            session_probe: Mutex::new(None),
            observed_progress: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            share_count: AtomicUsize::new(0),
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_files(self, files: Vec<FileRecord>) -> Self {
        *self.local_files.lock().unwrap() = Some(files);
        self
    }

    pub fn with_directory(self, files: Vec<FileRecord>) -> Self {
        *self.directory.lock().unwrap() = Some(files);
        self
    }

    /// `None` makes `fetch_identity` fail with a network error
    pub fn set_identity(&self, identity: Option<PeerIdentity>) {
        *self.identity.lock().unwrap() = identity;
    }

    /// `None` makes `fetch_local_files` fail with a network error
    pub fn set_local_files(&self, files: Option<Vec<FileRecord>>) {
        *self.local_files.lock().unwrap() = files;
    }

    /// `None` makes `search` fail with a network error
    pub fn set_directory(&self, files: Option<Vec<FileRecord>>) {
        *self.directory.lock().unwrap() = files;
    }

    /// Delay responses to queries with this text
    pub fn delay_search(&self, text: &str, delay: Duration) {
        self.search_delays.lock().unwrap().insert(text.to_string(), delay);
    }

    pub fn fail_unshare(&self, status: u16) {
        *self.unshare_failure.lock().unwrap() = Some(status);
    }

    pub fn script_upload(&self, points: Vec<u64>, outcome: UploadOutcome) {
        *self.progress_points.lock().unwrap() = points;
        *self.upload_outcome.lock().unwrap() = outcome;
    }

    /// Hold the next upload in flight until the returned sender fires
    pub fn hold_upload(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.upload_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Record the session's `bytes_sent` after every progress callback
    pub fn probe_session(&self, rx: watch::Receiver<Option<UploadSession>>) {
        *self.session_probe.lock().unwrap() = Some(rx);
    }

    pub fn observed_progress(&self) -> Vec<u64> {
        self.observed_progress.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|c| *c == wanted).count()
    }

    pub fn local_fetches(&self) -> usize {
        self.count(&Call::LocalFiles)
    }

    pub fn share_count(&self) -> usize {
        self.share_count.load(Ordering::SeqCst)
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn offline() -> ClientError {
        ClientError::Network("connection refused".to_string())
    }
}

impl Transport for MockTransport {
    async fn fetch_identity(&self) -> Result<PeerIdentity> {
        self.log(Call::Identity);
        let identity = self.identity.lock().unwrap().clone();
        identity.ok_or_else(Self::offline)
    }

    async fn fetch_local_files(&self) -> Result<Vec<FileRecord>> {
        self.log(Call::LocalFiles);
        let files = self.local_files.lock().unwrap().clone();
        files.ok_or_else(Self::offline)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<FileRecord>> {
        self.log(Call::Search(query.text.clone()));

        // snapshot at issue time, answer after the delay
        let directory = self.directory.lock().unwrap().clone();
        let delay = self.search_delays.lock().unwrap().get(&query.text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let text = query.text.to_lowercase();
        let files = directory.ok_or_else(Self::offline)?;
        Ok(files
            .into_iter()
            .filter(|f| text.is_empty() || f.filename.to_lowercase().contains(&text))
            .collect())
    }

    async fn share_file(&self, payload: UploadPayload, progress: ProgressCallback) -> Result<()> {
        self.log(Call::Share(payload.filename.clone()));
        self.share_count.fetch_add(1, Ordering::SeqCst);

        let gate = self.upload_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let total = payload.len();
        let points = self.progress_points.lock().unwrap().clone();
        for sent in points {
            progress(sent, total);
            let probe = self.session_probe.lock().unwrap().clone();
            if let Some(probe) = probe {
                let observed = probe.borrow().as_ref().map(|s| s.bytes_sent);
                if let Some(observed) = observed {
                    self.observed_progress.lock().unwrap().push(observed);
                }
            }
        }

        let outcome = self.upload_outcome.lock().unwrap().clone();
        match outcome {
            UploadOutcome::Succeed => {
                let stored = FileRecord::new(
                    format!("srv-{}", payload.filename),
                    payload.filename.clone(),
                    total,
                );
                if let Some(files) = self.local_files.lock().unwrap().as_mut() {
                    files.push(stored);
                }
                Ok(())
            }
            UploadOutcome::Status(status, message) => {
                Err(ClientError::from_status(status, message))
            }
            UploadOutcome::Disconnect => Err(Self::offline()),
        }
    }

    async fn unshare_file(&self, file_id: &str) -> Result<()> {
        self.log(Call::Unshare(file_id.to_string()));

        let failure = *self.unshare_failure.lock().unwrap();
        if let Some(status) = failure {
            return Err(ClientError::from_status(status, "unshare rejected"));
        }

        let mut local = self.local_files.lock().unwrap();
        let files = local.as_mut().ok_or_else(Self::offline)?;
        let before = files.len();
        files.retain(|f| f.id != file_id);
        if files.len() == before {
            return Err(ClientError::NotFound(format!("File not found: {}", file_id)));
        }
        Ok(())
    }
}
