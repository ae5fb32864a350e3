//! List member records and the page envelope they arrive in.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Column order shared by the CSV header and each CSV row.
pub const TABLE_HEADER: [&str; 6] = [
    "handle",
    "displayName",
    "id",
    "verified",
    "followersCount",
    "followingCount",
];

/// One list member.
///
/// Optional provider fields are defaulted here, so sinks always see a
/// complete record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub handle: String,
    #[serde(default)]
    pub display_name: String,
    pub id: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
}

/// One page of list members plus the cursor for the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<Record>,
    pub next_token: Option<String>,
}

impl Page {
    /// Parse a members page body.
    ///
    /// A missing `data` array is an empty page; a member without `id` or
    /// `username` makes the whole page malformed.
    pub fn parse(body: &str) -> Result<Self> {
        let raw: RawPage = serde_json::from_str(body).map_err(AppError::malformed)?;
        let records = raw
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Record::try_from)
            .collect::<Result<Vec<_>>>()?;
        let next_token = raw
            .meta
            .and_then(|m| m.next_token)
            .filter(|t| !t.is_empty());
        Ok(Self {
            records,
            next_token,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

/// List metadata used to name output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListInfo {
    pub id: String,
    pub name: String,
}

impl ListInfo {
    /// Parse a `GET /lists/{id}` body.
    pub fn parse(body: &str) -> Result<Self> {
        let raw: RawListEnvelope = serde_json::from_str(body).map_err(AppError::malformed)?;
        let data = raw
            .data
            .ok_or_else(|| AppError::malformed("list metadata has no data object"))?;
        Ok(Self {
            id: data.id,
            name: data.name.unwrap_or_default(),
        })
    }
}

/// Extract a human readable message from a provider error body.
///
/// Prefers `title: detail`, then the first `errors[].message`, then a
/// trimmed excerpt of the raw body.
pub fn error_detail(body: &str) -> String {
    const EXCERPT_CHARS: usize = 200;

    if let Ok(err) = serde_json::from_str::<RawError>(body) {
        match (err.title, err.detail) {
            (Some(title), Some(detail)) => return format!("{title}: {detail}"),
            (Some(single), None) | (None, Some(single)) => return single,
            (None, None) => {}
        }
        if let Some(message) = err
            .errors
            .unwrap_or_default()
            .into_iter()
            .find_map(|e| e.message)
        {
            return message;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    trimmed.chars().take(EXCERPT_CHARS).collect()
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
struct RawPage {
    data: Option<Vec<RawUser>>,
    meta: Option<RawMeta>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: Option<String>,
    username: Option<String>,
    name: Option<String>,
    verified: Option<bool>,
    public_metrics: Option<RawMetrics>,
}

#[derive(Debug, Deserialize)]
struct RawMetrics {
    followers_count: Option<u64>,
    following_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawListEnvelope {
    data: Option<RawList>,
}

#[derive(Debug, Deserialize)]
struct RawList {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    title: Option<String>,
    detail: Option<String>,
    errors: Option<Vec<RawErrorItem>>,
}

#[derive(Debug, Deserialize)]
struct RawErrorItem {
    message: Option<String>,
}

impl TryFrom<RawUser> for Record {
    type Error = AppError;

    fn try_from(raw: RawUser) -> Result<Self> {
        let id = raw
            .id
            .ok_or_else(|| AppError::malformed("member without id"))?;
        let handle = raw
            .username
            .ok_or_else(|| AppError::malformed(format!("member {id} without username")))?;
        let (followers_count, following_count) = raw
            .public_metrics
            .map(|m| {
                (
                    m.followers_count.unwrap_or_default(),
                    m.following_count.unwrap_or_default(),
                )
            })
            .unwrap_or_default();

        Ok(Self {
            handle,
            display_name: raw.name.unwrap_or_default(),
            id,
            verified: raw.verified.unwrap_or_default(),
            followers_count,
            following_count,
        })
    }
}
