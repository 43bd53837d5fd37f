//! Domain model shared by the API service and the gallery client

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse label attached to an image for filtering purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Landscape,
    Portrait,
    Abstract,
    Nature,
}

/// Filename keywords checked in priority order; the first hit wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Portrait, &["portrait", "face", "person"]),
    (Category::Abstract, &["abstract", "art"]),
    (Category::Nature, &["nature", "flower", "tree", "animal"]),
];

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Landscape,
        Category::Portrait,
        Category::Abstract,
        Category::Nature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Landscape => "landscape",
            Category::Portrait => "portrait",
            Category::Abstract => "abstract",
            Category::Nature => "nature",
        }
    }

    /// Derive a category from the original filename alone.
    ///
    /// Case-insensitive substring match, never looks at file contents.
    pub fn from_filename(name: &str) -> Self {
        let name = name.to_lowercase();

        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// User entity, mirrored from the external identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// User update payload, only the provided fields are merged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    /// Resolve the avatar reference the same way image sources are resolved
    pub fn avatar_source(&self, base_url: &str) -> Option<String> {
        self.avatar_url
            .as_deref()
            .map(|reference| resolve_reference(base_url, reference))
    }
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.full_name.is_none() && self.avatar_url.is_none()
    }
}

/// Image metadata record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Uuid,
    /// Storage reference: a bare filename for local storage, a full URL for object storage
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub category: Category,
    pub uploaded_at: DateTime<Utc>,
    pub user_id: Option<String>,
}

impl Image {
    /// Resolve the storage reference to something a browser can fetch.
    pub fn source_url(&self, base_url: &str) -> String {
        resolve_reference(base_url, &self.filename)
    }
}

/// Absolute URLs pass through, bare filenames are served under `/uploads`
fn resolve_reference(base_url: &str, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        reference.to_string()
    } else {
        format!("{}/uploads/{}", base_url.trim_end_matches('/'), reference)
    }
}

/// Image creation payload; id and upload time are assigned by the repository
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub category: Option<Category>,
    pub user_id: Option<String>,
}
