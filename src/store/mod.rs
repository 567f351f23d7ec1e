//! Lead persistence contract and its implementations.
//!
//! Any storage engine can back the application as long as it honours
//! [`LeadStore`]: rows are unique per `(user, name, phone)`, queries are scoped
//! to one user, and pages come back with the exact count of matching rows.

pub mod memory;
pub mod sqlite;

use serde::Serialize;
use thiserror::Error;

use crate::lead::{Lead, StoredLead};
use crate::leads::{self, SortDirection, SortKey, SortState};

pub use memory::MemoryLeadStore;
pub use sqlite::SqliteLeadStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Keyset position: the sort value and id of the last row already seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCursor {
    pub sort_value: String,
    pub id: String,
}

impl LeadCursor {
    pub fn after(row: &StoredLead, key: SortKey) -> Self {
        LeadCursor {
            sort_value: key.value_of(&row.lead),
            id: row.id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeadQuery {
    pub sort: SortKey,
    pub direction: SortDirection,
    pub specialty: Option<String>,
    pub search_query: Option<String>,
    pub text: Option<String>,
    /// 1-based; ignored when `after` is set.
    pub page: usize,
    pub page_size: usize,
    pub after: Option<LeadCursor>,
}

impl Default for LeadQuery {
    fn default() -> Self {
        LeadQuery {
            sort: SortKey::ScrapedAt,
            direction: SortDirection::Descending,
            specialty: None,
            search_query: None,
            text: None,
            page: 1,
            page_size: 10,
            after: None,
        }
    }
}

impl LeadQuery {
    pub fn sort_state(&self) -> SortState {
        SortState {
            key: self.sort,
            direction: self.direction,
        }
    }

    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.max(1)
    }

    pub fn offset(&self) -> usize {
        if self.after.is_some() {
            0
        } else {
            (self.page() - 1).saturating_mul(self.page_size())
        }
    }

    /// Trimmed, lower-cased text filter; `None` when blank.
    pub fn text_filter(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    /// Equality and text filters, without pagination or cursor.
    pub fn matches(&self, row: &StoredLead) -> bool {
        if let Some(specialty) = &self.specialty {
            if &row.lead.specialty != specialty {
                return false;
            }
        }
        if let Some(query) = &self.search_query {
            if &row.lead.search_query != query {
                return false;
            }
        }
        match self.text_filter() {
            Some(term) => leads::matches_text(&row.lead, &term),
            None => true,
        }
    }

    /// True when `row` sorts strictly after the cursor.
    pub fn is_past_cursor(&self, row: &StoredLead) -> bool {
        let Some(cursor) = &self.after else {
            return true;
        };
        let value = self.sort.value_of(&row.lead);
        let ordering = value
            .as_str()
            .cmp(cursor.sort_value.as_str())
            .then_with(|| row.id.as_str().cmp(cursor.id.as_str()));
        self.direction.apply(ordering).is_gt()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPage {
    pub data: Vec<StoredLead>,
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<LeadCursor>,
}

impl LeadPage {
    pub fn new(data: Vec<StoredLead>, count: usize, query: &LeadQuery) -> Self {
        let page_size = query.page_size();
        let next_cursor = if data.len() == page_size {
            data.last().map(|row| LeadCursor::after(row, query.sort))
        } else {
            None
        };
        LeadPage {
            data,
            count,
            page: query.page(),
            page_size,
            total_pages: leads::total_pages(count, page_size),
            next_cursor,
        }
    }
}

pub trait LeadStore: Send + Sync {
    /// Inserts the leads not already stored for `user_id`, atomically.
    /// Returns how many rows were new.
    fn save_leads(&self, user_id: &str, leads: &[Lead]) -> Result<usize, StoreError>;

    fn query(&self, user_id: &str, query: &LeadQuery) -> Result<LeadPage, StoreError>;

    fn count(&self, user_id: &str) -> Result<usize, StoreError>;

    /// Every lead for one search query, newest first.
    fn by_search_query(&self, user_id: &str, search_query: &str) -> Result<Vec<StoredLead>, StoreError>;

    /// Distinct specialties, sorted.
    fn specialties(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
}
