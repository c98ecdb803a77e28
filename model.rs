//! Wire and domain types shared by the cache, controllers and views.
//!
//! Every optional field defaults instead of failing the decode: the
//! directory service omits fields freely and encodes empty lists as `null`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity and counters of the local peer, as reported by `/api/v1/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerIdentity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub port: u16,
    /// Registration with the directory; drives the online/offline display
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_registered: bool,
    #[serde(rename = "shared_files", default, deserialize_with = "null_as_default")]
    pub shared_file_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_stats: DownloadStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upload_stats: UploadStats,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub last_heartbeat: Option<String>,
}

impl PeerIdentity {
    pub fn is_online(&self) -> bool {
        self.is_registered
    }

    /// `address:port` as shown in the identity panel
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadStats {
    #[serde(
        rename = "total_downloads",
        alias = "TotalDownloads",
        default,
        deserialize_with = "null_as_default"
    )]
    pub total_downloads: u64,
    #[serde(alias = "TotalBytes", default, deserialize_with = "null_as_default")]
    pub total_bytes: u64,
    #[serde(alias = "ActiveDownloads", default, deserialize_with = "null_as_default")]
    pub active_downloads: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadStats {
    #[serde(
        rename = "total_uploads",
        alias = "TotalUploads",
        default,
        deserialize_with = "null_as_default"
    )]
    pub total_uploads: u64,
    #[serde(alias = "TotalBytes", default, deserialize_with = "null_as_default")]
    pub total_bytes: u64,
    #[serde(alias = "ActiveUploads", default, deserialize_with = "null_as_default")]
    pub active_uploads: u64,
}

/// File category. Parsed case-insensitively; anything unknown is `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Document,
    Image,
    Video,
    Audio,
    Archive,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Document,
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Archive,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Image => "image",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Archive => "archive",
            Category::Other => "other",
        }
    }

    /// Lenient parse used for wire data.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "document" => Category::Document,
            "image" => Category::Image,
            "video" => Category::Video,
            "audio" => Category::Audio,
            "archive" => Category::Archive,
            _ => Category::Other,
        }
    }

    /// Display label ("Document", "Other", ...)
    pub fn label(&self) -> &'static str {
        match self {
            Category::Document => "Document",
            Category::Image => "Image",
            Category::Video => "Video",
            Category::Audio => "Audio",
            Category::Archive => "Archive",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Category::parse_lossy(&s)).unwrap_or_default())
    }
}

/// A locally shared file or a network search hit.
///
/// Records are owned by the list they arrived in; the same `id` in the
/// local list and the search list is two separate values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(rename = "size", default, deserialize_with = "null_as_default")]
    pub size_bytes: u64,
    #[serde(default)]
    pub category: Category,
    #[serde(rename = "owner", default, deserialize_with = "empty_as_none")]
    pub owner_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub peer_address: Option<String>,
    #[serde(rename = "downloads", default, deserialize_with = "null_as_default")]
    pub download_count: u64,
    #[serde(rename = "hash", default, deserialize_with = "empty_as_none")]
    pub content_hash: Option<String>,
    #[serde(
        rename = "upload_time",
        alias = "shared_at",
        default,
        deserialize_with = "empty_as_none"
    )]
    pub upload_timestamp: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
}

impl FileRecord {
    pub fn new(id: impl Into<String>, filename: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            size_bytes,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

/// Body of `/api/v1/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<FileRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: usize,
}

/// Category filter of a search. `All` sends no server-side filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Lower-cased category name; must equal a record's normalized category
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(name) => name == category.as_str(),
        }
    }

    /// Value of the `category` query parameter
    pub fn as_param(&self) -> &str {
        match self {
            CategoryFilter::All => "",
            CategoryFilter::Only(name) => name,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() || normalized == "all" {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(normalized))
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        CategoryFilter::Only(category.as_str().to_string())
    }
}

/// Server-side result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    Name,
    Size,
    Downloads,
    Rating,
    Date,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Name => "name",
            SortOrder::Size => "size",
            SortOrder::Downloads => "downloads",
            SortOrder::Rating => "rating",
            SortOrder::Date => "date",
        }
    }
}

/// A directory lookup. Empty text matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub category: CategoryFilter,
    pub sort: Option<SortOrder>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, category: &str) -> Self {
        Self {
            text: text.into(),
            // infallible
            category: category.parse().unwrap_or_default(),
            sort: None,
            limit: None,
        }
    }

    /// Empty text, every category: the full directory snapshot
    pub fn everything() -> Self {
        Self::default()
    }
}

/// Which cache list a record was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrigin {
    Local,
    Network,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}
