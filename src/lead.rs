use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A business lead produced by a search or an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub name: String,
    pub specialty: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
    #[serde(default)]
    pub search_query: String,
}

impl Lead {
    /// Phone number as stored; a missing phone is the empty string.
    pub fn phone_or_empty(&self) -> &str {
        self.phone_number.as_deref().unwrap_or("")
    }

    /// Identity used for duplicate detection within one user's data.
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.name.as_str(), self.phone_or_empty())
    }
}

impl AsRef<Lead> for Lead {
    fn as_ref(&self) -> &Lead {
        self
    }
}

/// A lead as persisted for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLead {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub lead: Lead,
    pub created_at: DateTime<Utc>,
}

impl AsRef<Lead> for StoredLead {
    fn as_ref(&self) -> &Lead {
        &self.lead
    }
}

/// Fixed-width UTC timestamp text. Lexical order equals chronological order,
/// which the stores rely on for sorting and cursors.
pub fn timestamp_key(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
