pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod contact;
pub mod delay_manager;
pub mod error;
pub mod export;
pub mod generator;
pub mod harvest;
pub mod lead;
pub mod lead_import;
pub mod leads;
pub mod logger;
pub mod source;
pub mod store;

// Exporting types for convenience
pub use config::Config;
pub use error::HarvestError;
pub use harvest::LeadService;
pub use lead::{Lead, StoredLead};
pub use source::{LeadSource, MockLeadSource, ScriptLeadSource, ScrollCount, SearchRequest};
pub use store::{LeadQuery, LeadStore, MemoryLeadStore, SqliteLeadStore};
