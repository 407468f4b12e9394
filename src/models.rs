use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a software entry is distributed: a single download or a set of parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Single,
    Multiple,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Single => "single",
            FileType::Multiple => "multiple",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "single" => Some(FileType::Single),
            "multiple" => Some(FileType::Multiple),
            _ => None,
        }
    }
}

/// A downloadable software entry that license keys are issued against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Software {
    pub id: String,
    pub name: String,
    pub file_type: FileType,
    pub download_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSoftware {
    pub name: String,
    pub file_type: FileType,
    pub download_urls: Vec<String>,
}

/// A license key scoped to one software entry.
///
/// `first_used_at` is written exactly once, on the first successful
/// validation, and never changes afterwards. Whether a key is "used" is
/// derived from its presence rather than stored separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub id: String,
    pub code: String,
    pub software_id: String,
    pub created_at: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub first_used_at: Option<DateTime<Utc>>,
}

impl Key {
    pub fn is_used(&self) -> bool {
        self.first_used_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.valid_until, Some(until) if until < now)
    }
}

/// A key joined with its software entry for admin listings.
///
/// `software` is `None` for orphaned keys whose software was deleted out
/// from under them (a crash between a software delete and its key sweep).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyWithSoftware {
    #[serde(flatten)]
    pub key: Key,
    pub software: Option<Software>,
    pub used: bool,
}

/// The singleton admin identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub updated_at: DateTime<Utc>,
}
