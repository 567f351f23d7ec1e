//! Where leads come from.
//!
//! [`LeadSource`] is the seam between the application and a search backend.
//! [`MockLeadSource`] synthesizes leads locally; [`ScriptLeadSource`] runs an
//! external scraper program and reads its JSON output.

use std::fmt;
use std::process::Command;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{Config, GeneratorConfig, SourceConfig, SourceKind};
use crate::delay_manager;
use crate::generator::{self, LeadGenerator};
use crate::lead::Lead;
use crate::leads::dedup_by_name_phone;

const DEFAULT_SCROLL_PAGES: u32 = 10;
const ALL_SCROLL_PAGES: u32 = 25;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("search query is required")]
    EmptyQuery,

    #[error("failed to start scraper: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("scraper exited with status {code:?}: {stderr}")]
    ScriptFailed { code: Option<i32>, stderr: String },

    #[error("failed to parse scraper output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("script source needs a program")]
    MissingProgram,
}

/// How far to scroll the result list: a page count or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCount {
    Pages(u32),
    All,
}

impl Default for ScrollCount {
    fn default() -> Self {
        ScrollCount::Pages(DEFAULT_SCROLL_PAGES)
    }
}

impl ScrollCount {
    /// Pages the generator sizes its result by. Zero pages means "unset".
    pub fn pages(self) -> u32 {
        match self {
            ScrollCount::All => ALL_SCROLL_PAGES,
            ScrollCount::Pages(0) => DEFAULT_SCROLL_PAGES,
            ScrollCount::Pages(n) => n,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid scroll count '{0}', expected a number or \"all\"")]
pub struct ParseScrollCountError(String);

impl FromStr for ScrollCount {
    type Err = ParseScrollCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(ScrollCount::All);
        }
        s.parse::<u32>()
            .map(ScrollCount::Pages)
            .map_err(|_| ParseScrollCountError(s.to_string()))
    }
}

impl fmt::Display for ScrollCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollCount::Pages(n) => write!(f, "{}", n),
            ScrollCount::All => f.write_str("all"),
        }
    }
}

impl Serialize for ScrollCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScrollCount::Pages(n) => serializer.serialize_u32(*n),
            ScrollCount::All => serializer.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for ScrollCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Browsers send either a number or the string form of one.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(ScrollCount::Pages(n)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// One search as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, alias = "scrollAmount", skip_serializing_if = "Option::is_none")]
    pub scroll_count: Option<ScrollCount>,
    #[serde(default, alias = "locations")]
    pub localities: Vec<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        SearchRequest {
            query: query.into(),
            ..SearchRequest::default()
        }
    }

    /// The query text, or `"<profession> in <location>"` when only the parts
    /// were given.
    pub fn effective_query(&self) -> String {
        let query = self.query.trim();
        if !query.is_empty() {
            return query.to_string();
        }
        let profession = self.profession.as_deref().map(str::trim).unwrap_or("");
        let location = self.location.as_deref().map(str::trim).unwrap_or("");
        match (profession.is_empty(), location.is_empty()) {
            (true, _) => String::new(),
            (false, true) => profession.to_string(),
            (false, false) => format!("{}{}{}", profession, generator::QUERY_SEPARATOR, location),
        }
    }

    /// One query per requested locality, in request order.
    pub fn locality_queries(&self) -> Vec<String> {
        let query = self.effective_query();
        let (parsed_profession, parsed_location) = generator::split_query(&query);
        let profession = self
            .profession
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(parsed_profession);
        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(parsed_location);

        self.localities
            .iter()
            .map(|locality| locality.trim())
            .filter(|locality| !locality.is_empty())
            .map(|locality| {
                format!("{}{}{} {}", profession, generator::QUERY_SEPARATOR, locality, location)
                    .trim_end()
                    .to_string()
            })
            .collect()
    }
}

pub trait LeadSource: Send + Sync {
    fn name(&self) -> &str;

    fn search(&self, request: &SearchRequest) -> Result<Vec<Lead>, SourceError>;
}

/// Synthesizes leads from the catalog tables.
pub struct MockLeadSource {
    generator: LeadGenerator,
    delay_ms_min: u64,
    delay_ms_max: u64,
    rng: Mutex<StdRng>,
}

impl MockLeadSource {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible output for a given seed.
    pub fn seeded(config: &GeneratorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &GeneratorConfig, rng: StdRng) -> Self {
        MockLeadSource {
            generator: LeadGenerator::new(config),
            delay_ms_min: config.delay_ms_min,
            delay_ms_max: config.delay_ms_max,
            rng: Mutex::new(rng),
        }
    }

    fn generate_one(&self, query: &str, scroll: Option<ScrollCount>) -> Vec<Lead> {
        delay_manager::simulated_search_delay(self.delay_ms_min, self.delay_ms_max);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.generator.generate(query, scroll, &mut *rng)
    }
}

impl LeadSource for MockLeadSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<Lead>, SourceError> {
        let query = request.effective_query();
        if query.is_empty() {
            return Err(SourceError::EmptyQuery);
        }

        let locality_queries = request.locality_queries();
        if locality_queries.is_empty() {
            let leads = self.generate_one(&query, request.scroll_count);
            info!("Generated {} leads for '{}'", leads.len(), query);
            return Ok(leads);
        }

        let mut all = Vec::new();
        for locality_query in &locality_queries {
            let mut leads = self.generate_one(locality_query, request.scroll_count);
            debug!("{} leads for locality query '{}'", leads.len(), locality_query);
            all.append(&mut leads);
        }
        let total = all.len();
        let unique = dedup_by_name_phone(all);
        info!(
            "Generated {} leads ({} unique) for '{}' across {} localities",
            total,
            unique.len(),
            query,
            locality_queries.len()
        );
        Ok(unique)
    }
}

/// Runs an external scraper: `<program> <args..> --query Q --scrolls N
/// --locations <json array>`, expecting a JSON array of leads on stdout.
pub struct ScriptLeadSource {
    program: String,
    args: Vec<String>,
}

impl ScriptLeadSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ScriptLeadSource {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        let program = config.program.clone().ok_or(SourceError::MissingProgram)?;
        Ok(Self::new(program, config.args.clone()))
    }
}

impl LeadSource for ScriptLeadSource {
    fn name(&self) -> &str {
        &self.program
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<Lead>, SourceError> {
        let query = request.effective_query();
        if query.is_empty() {
            return Err(SourceError::EmptyQuery);
        }
        let scrolls = request.scroll_count.unwrap_or_default().to_string();
        let locations = serde_json::to_string(&request.localities)?;

        info!("Starting scrape for: {} ({})", query, self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(["--query", query.as_str(), "--scrolls", scrolls.as_str(), "--locations", locations.as_str()])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("Scraper exited with {:?}: {}", output.status.code(), stderr);
            return Err(SourceError::ScriptFailed {
                code: output.status.code(),
                stderr,
            });
        }

        let mut leads: Vec<Lead> = serde_json::from_slice(&output.stdout)?;
        for lead in &mut leads {
            if lead.search_query.is_empty() {
                lead.search_query = query.clone();
            }
        }
        info!("Scraper returned {} leads for '{}'", leads.len(), query);
        Ok(leads)
    }
}

pub fn build_source(config: &Config) -> Result<Box<dyn LeadSource>, SourceError> {
    match config.source.kind {
        SourceKind::Mock => Ok(Box::new(MockLeadSource::new(&config.generator))),
        SourceKind::Script => Ok(Box::new(ScriptLeadSource::from_config(&config.source)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn quiet_config() -> GeneratorConfig {
        GeneratorConfig {
            delay_ms_min: 0,
            delay_ms_max: 0,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_scroll_count_parsing() {
        assert_eq!("all".parse::<ScrollCount>(), Ok(ScrollCount::All));
        assert_eq!(" 12 ".parse::<ScrollCount>(), Ok(ScrollCount::Pages(12)));
        assert!("lots".parse::<ScrollCount>().is_err());
        assert_eq!(ScrollCount::Pages(0).pages(), 10);
        assert_eq!(ScrollCount::All.pages(), 25);
    }

    #[test]
    fn test_request_accepts_browser_shapes() {
        let request: SearchRequest = serde_json::from_str(
            r#"{"query":"Dentist in Mumbai","scrollAmount":"all","locations":["Andheri","Bandra"]}"#,
        )
        .unwrap();
        assert_eq!(request.scroll_count, Some(ScrollCount::All));
        assert_eq!(request.localities, vec!["Andheri", "Bandra"]);

        let request: SearchRequest = serde_json::from_str(r#"{"query":"Cafe","scrollCount":"15"}"#).unwrap();
        assert_eq!(request.scroll_count, Some(ScrollCount::Pages(15)));

        let request: SearchRequest = serde_json::from_str(r#"{"query":"Cafe","scrollCount":4}"#).unwrap();
        assert_eq!(request.scroll_count, Some(ScrollCount::Pages(4)));
    }

    #[test]
    fn test_effective_query_from_parts() {
        let request = SearchRequest {
            profession: Some("Dentist".to_string()),
            location: Some("Pune".to_string()),
            ..SearchRequest::default()
        };
        assert_eq!(request.effective_query(), "Dentist in Pune");
        assert_eq!(SearchRequest::new("  ").effective_query(), "");
    }

    #[test]
    fn test_locality_queries() {
        let mut request = SearchRequest::new("Dentist in Mumbai");
        request.localities = vec!["Andheri".to_string(), " ".to_string(), "Bandra".to_string()];
        assert_eq!(
            request.locality_queries(),
            vec!["Dentist in Andheri Mumbai", "Dentist in Bandra Mumbai"]
        );
    }

    #[test]
    fn test_mock_source_rejects_empty_query() {
        let source = MockLeadSource::seeded(&quiet_config(), 1);
        assert!(matches!(source.search(&SearchRequest::new("")), Err(SourceError::EmptyQuery)));
    }

    #[test]
    fn test_mock_source_fans_out_and_dedups() {
        let source = MockLeadSource::seeded(&quiet_config(), 9);
        let mut request = SearchRequest::new("Salon in Mumbai");
        request.scroll_count = Some(ScrollCount::Pages(2));
        request.localities = vec!["Andheri".to_string(), "Powai".to_string()];

        let leads = source.search(&request).unwrap();
        assert!(!leads.is_empty());

        let keys: HashSet<(&str, &str)> = leads.iter().map(|l| l.dedup_key()).collect();
        assert_eq!(keys.len(), leads.len());
        assert!(leads
            .iter()
            .all(|l| l.search_query == "Salon in Andheri Mumbai" || l.search_query == "Salon in Powai Mumbai"));
    }

    #[cfg(unix)]
    #[test]
    fn test_script_source_reads_stdout() {
        let script = r#"echo '[{"name":"Kapoor Dental","specialty":"Dentist","address":"9, SV Road, Mumbai","phoneNumber":"+91 9000000001"}]'"#;
        let source = ScriptLeadSource::new("sh", vec!["-c".to_string(), script.to_string(), "scraper".to_string()]);
        let leads = source.search(&SearchRequest::new("Dentist in Mumbai")).unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Kapoor Dental");
        assert_eq!(leads[0].search_query, "Dentist in Mumbai");
    }

    #[cfg(unix)]
    #[test]
    fn test_script_source_reports_failure() {
        let source = ScriptLeadSource::new(
            "sh",
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string(), "scraper".to_string()],
        );
        match source.search(&SearchRequest::new("Dentist")) {
            Err(SourceError::ScriptFailed { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected result: {:?}", other.map(|l| l.len())),
        }
    }
}
