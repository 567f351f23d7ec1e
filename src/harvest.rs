//! Search-then-persist workflow shared by the HTTP server and the CLI.

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info, warn};

use crate::config::{Config, StorageBackend, StorageConfig};
use crate::contact::ContactValidator;
use crate::error::HarvestError;
use crate::lead::{Lead, StoredLead};
use crate::leads::LeadStats;
use crate::source::{build_source, LeadSource, SearchRequest, SourceError};
use crate::store::{LeadPage, LeadQuery, LeadStore, MemoryLeadStore, SqliteLeadStore, StoreError};

const IN_MEMORY_DATABASE: &str = ":memory:";

pub fn build_store(config: &StorageConfig) -> Result<Arc<dyn LeadStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryLeadStore::new())),
        StorageBackend::Sqlite if config.database == IN_MEMORY_DATABASE => {
            Ok(Arc::new(SqliteLeadStore::open_in_memory()?))
        }
        StorageBackend::Sqlite => Ok(Arc::new(SqliteLeadStore::open(Path::new(&config.database))?)),
    }
}

/// Background persist started by a search. Resolves to whether the save
/// succeeded.
pub struct PersistHandle(JoinHandle<bool>);

impl PersistHandle {
    pub fn wait(self) -> bool {
        self.0.join().unwrap_or_else(|_| {
            error!("Lead persist thread panicked");
            false
        })
    }
}

pub struct SearchOutcome {
    pub leads: Vec<Lead>,
    /// `None` when there was nothing to save.
    pub persist: Option<PersistHandle>,
}

#[derive(Clone)]
pub struct LeadService {
    source: Arc<dyn LeadSource>,
    store: Arc<dyn LeadStore>,
    validator: Arc<ContactValidator>,
    batch_size: usize,
}

impl LeadService {
    pub fn new(
        source: Arc<dyn LeadSource>,
        store: Arc<dyn LeadStore>,
        validator: ContactValidator,
        batch_size: usize,
    ) -> Self {
        LeadService {
            source,
            store,
            validator: Arc::new(validator),
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let source: Arc<dyn LeadSource> = Arc::from(build_source(config)?);
        let store = build_store(&config.storage)?;
        info!("Using lead source '{}'", source.name());
        Ok(Self::new(source, store, ContactValidator::new()?, config.export.batch_size))
    }

    /// Runs the search and hands the results to a detached persist. The
    /// caller gets the leads whether or not the save later fails.
    pub fn search(&self, user_id: &str, request: &SearchRequest) -> Result<SearchOutcome, SourceError> {
        let leads: Vec<Lead> = self
            .source
            .search(request)?
            .into_iter()
            .map(|lead| self.validator.sanitize(lead))
            .collect();

        let persist = if leads.is_empty() {
            warn!("No leads found for '{}'", request.effective_query());
            None
        } else {
            Some(self.spawn_save(user_id, leads.clone()))
        };
        Ok(SearchOutcome { leads, persist })
    }

    pub fn spawn_save(&self, user_id: &str, leads: Vec<Lead>) -> PersistHandle {
        let service = self.clone();
        let user_id = user_id.to_string();
        PersistHandle(thread::spawn(move || service.save(&user_id, leads)))
    }

    /// Validates contact fields, then inserts whatever is new.
    pub fn save_leads(&self, user_id: &str, leads: Vec<Lead>) -> Result<usize, StoreError> {
        let total = leads.len();
        let leads: Vec<Lead> = leads.into_iter().map(|lead| self.validator.sanitize(lead)).collect();
        let inserted = self.store.save_leads(user_id, &leads)?;
        info!(
            "Saved {} new leads for user {} ({} duplicates skipped)",
            inserted,
            user_id,
            total - inserted
        );
        Ok(inserted)
    }

    /// Boolean form of [`save_leads`](Self::save_leads); the error is logged.
    pub fn save(&self, user_id: &str, leads: Vec<Lead>) -> bool {
        match self.save_leads(user_id, leads) {
            Ok(_) => true,
            Err(e) => {
                error!("Error saving leads for user {}: {}", user_id, e);
                false
            }
        }
    }

    pub fn page(&self, user_id: &str, query: &LeadQuery) -> Result<LeadPage, StoreError> {
        self.store.query(user_id, query)
    }

    /// Every row matching the filters, fetched in cursor batches.
    pub fn collect_all(&self, user_id: &str, query: &LeadQuery) -> Result<Vec<StoredLead>, StoreError> {
        let mut batch_query = LeadQuery {
            page: 1,
            page_size: self.batch_size,
            after: None,
            ..query.clone()
        };
        let mut rows = Vec::new();
        loop {
            let page = self.store.query(user_id, &batch_query)?;
            rows.extend(page.data);
            match page.next_cursor {
                Some(cursor) => batch_query.after = Some(cursor),
                None => break,
            }
        }
        info!("Collected {} leads for user {}", rows.len(), user_id);
        Ok(rows)
    }

    pub fn stats(&self, user_id: &str) -> Result<LeadStats, StoreError> {
        let rows = self.collect_all(user_id, &LeadQuery::default())?;
        Ok(LeadStats::from_leads(&rows))
    }

    pub fn count(&self, user_id: &str) -> Result<usize, StoreError> {
        self.store.count(user_id)
    }

    pub fn specialties(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.store.specialties(user_id)
    }

    pub fn by_search_query(&self, user_id: &str, search_query: &str) -> Result<Vec<StoredLead>, StoreError> {
        self.store.by_search_query(user_id, search_query)
    }
}
