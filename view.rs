//! Immutable projections of cache snapshots for display.

use crate::model::{FileRecord, ListOrigin, PeerIdentity};
use chrono::{DateTime, Local};
use serde::Serialize;

const NOT_AVAILABLE: &str = "N/A";

/// Human-readable size, 1024-based, up to two decimals
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// First eight characters of an owner id, or N/A
pub fn short_owner(owner: Option<&str>) -> String {
    match owner {
        Some(owner) => format!("{}...", owner.chars().take(8).collect::<String>()),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn format_timestamp(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionStatus {
    Online,
    Offline,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Online => "Online",
            ConnectionStatus::Offline => "Offline",
        }
    }
}

/// Header panel: who this peer is and how it is doing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityPanel {
    pub peer_id: String,
    pub endpoint: String,
    pub status: ConnectionStatus,
    pub shared_files: u64,
    pub downloads: u64,
    pub uploads: u64,
}

impl IdentityPanel {
    pub fn project(identity: Option<&PeerIdentity>) -> Self {
        match identity {
            Some(identity) => Self {
                peer_id: identity.id.clone(),
                endpoint: identity.endpoint(),
                status: if identity.is_online() {
                    ConnectionStatus::Online
                } else {
                    ConnectionStatus::Offline
                },
                shared_files: identity.shared_file_count,
                downloads: identity.download_stats.total_downloads,
                uploads: identity.upload_stats.total_uploads,
            },
            None => Self {
                peer_id: NOT_AVAILABLE.to_string(),
                endpoint: NOT_AVAILABLE.to_string(),
                status: ConnectionStatus::Offline,
                shared_files: 0,
                downloads: 0,
                uploads: 0,
            },
        }
    }
}

/// Buttons offered on a file card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileAction {
    Info,
    Download,
    ShareLink,
    Unshare,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCard {
    pub id: String,
    pub filename: String,
    pub size: String,
    pub category: String,
    pub owner: String,
    pub downloads: u64,
    pub actions: Vec<FileAction>,
}

impl FileCard {
    pub fn project(record: &FileRecord, origin: ListOrigin) -> Self {
        let mut actions = vec![FileAction::Info, FileAction::Download];
        if origin == ListOrigin::Local {
            actions.extend([FileAction::ShareLink, FileAction::Unshare]);
        }

        Self {
            id: record.id.clone(),
            filename: record.filename.clone(),
            size: format_bytes(record.size_bytes),
            category: record.category.as_str().to_string(),
            owner: short_owner(record.owner_id.as_deref()),
            downloads: record.download_count,
            actions,
        }
    }

    pub fn project_all(records: &[FileRecord], origin: ListOrigin) -> Vec<Self> {
        records.iter().map(|r| Self::project(r, origin)).collect()
    }
}

/// Everything known about one file, for the info dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDetails {
    pub filename: String,
    pub size: String,
    pub category: String,
    pub hash: String,
    pub owner: String,
    pub peer_address: String,
    pub upload_time: String,
    pub downloads: u64,
    pub is_local: bool,
}

impl FileDetails {
    pub fn project(record: &FileRecord, origin: ListOrigin) -> Self {
        let or_na =
            |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            filename: record.filename.clone(),
            size: format_bytes(record.size_bytes),
            category: record.category.label().to_string(),
            hash: or_na(&record.content_hash),
            owner: or_na(&record.owner_id),
            peer_address: or_na(&record.peer_address),
            upload_time: format_timestamp(record.upload_timestamp.as_deref()),
            downloads: record.download_count,
            is_local: origin == ListOrigin::Local,
        }
    }
}
