use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

use chrono::{SubsecRound, Utc};
use log::info;
use uuid::Uuid;

use super::{LeadPage, LeadQuery, LeadStore, StoreError};
use crate::lead::{Lead, StoredLead};
use crate::leads::{compare_stored, SortDirection, SortKey, SortState};

/// Process-local store. Used for tests and for runs without a database file.
#[derive(Default)]
pub struct MemoryLeadStore {
    rows: Mutex<Vec<StoredLead>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredLead>>, StoreError> {
        self.rows.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl LeadStore for MemoryLeadStore {
    fn save_leads(&self, user_id: &str, leads: &[Lead]) -> Result<usize, StoreError> {
        let mut rows = self.rows()?;
        let mut existing: HashSet<(String, String)> = rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| (r.lead.name.clone(), r.lead.phone_or_empty().to_string()))
            .collect();

        let now = Utc::now();
        let mut inserted = 0;
        for lead in leads {
            let key = (lead.name.clone(), lead.phone_or_empty().to_string());
            if !existing.insert(key) {
                info!("Skipped duplicate lead: {}", lead.name);
                continue;
            }
            // Same precision as the SQLite column, so cursors compare alike.
            let mut lead = lead.clone();
            lead.scraped_at = lead.scraped_at.trunc_subsecs(6);
            rows.push(StoredLead {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                lead,
                created_at: now,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    fn query(&self, user_id: &str, query: &LeadQuery) -> Result<LeadPage, StoreError> {
        let rows = self.rows()?;
        let mut matching: Vec<&StoredLead> = rows
            .iter()
            .filter(|r| r.user_id == user_id && query.matches(r))
            .collect();
        let count = matching.len();

        let state = query.sort_state();
        matching.sort_by(|a, b| compare_stored(a, b, state));

        let data = matching
            .into_iter()
            .filter(|r| query.is_past_cursor(r))
            .skip(query.offset())
            .take(query.page_size())
            .cloned()
            .collect();
        Ok(LeadPage::new(data, count, query))
    }

    fn count(&self, user_id: &str) -> Result<usize, StoreError> {
        Ok(self.rows()?.iter().filter(|r| r.user_id == user_id).count())
    }

    fn by_search_query(&self, user_id: &str, search_query: &str) -> Result<Vec<StoredLead>, StoreError> {
        let mut found: Vec<StoredLead> = self
            .rows()?
            .iter()
            .filter(|r| r.user_id == user_id && r.lead.search_query == search_query)
            .cloned()
            .collect();
        let newest_first = SortState {
            key: SortKey::ScrapedAt,
            direction: SortDirection::Descending,
        };
        found.sort_by(|a, b| compare_stored(a, b, newest_first));
        Ok(found)
    }

    fn specialties(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let set: BTreeSet<String> = self
            .rows()?
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.lead.specialty.clone())
            .collect();
        Ok(set.into_iter().collect())
    }
}
