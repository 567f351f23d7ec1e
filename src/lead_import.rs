use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use log::{error, info, warn};
use serde::Deserialize;

use crate::lead::Lead;

/// One row of an uploaded lead sheet. Accepts the archive export headers and
/// a few common spellings.
#[derive(Debug, Deserialize, Clone)]
pub struct LeadRecord {
    #[serde(rename = "Name", alias = "name", alias = "Business Name", alias = "Company")]
    pub name: String,
    #[serde(rename = "Specialty", alias = "specialty", alias = "Type", alias = "Category", default)]
    pub specialty: String,
    #[serde(rename = "Address", alias = "address", default)]
    pub address: String,
    #[serde(rename = "Phone Number", alias = "phone", alias = "Phone", alias = "phoneNumber", default)]
    pub phone: Option<String>,
    #[serde(rename = "Email", alias = "email", default)]
    pub email: Option<String>,
    #[serde(rename = "Scraped Date", alias = "scrapedAt", alias = "scraped_at", default)]
    pub scraped_date: Option<String>,
    #[serde(rename = "Search Query", alias = "searchQuery", alias = "search_query", default)]
    pub search_query: Option<String>,
}

/// Export timestamps are local `YYYY-MM-DD HH:MM:SS`; RFC 3339 is accepted too.
fn parse_scraped_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|ts| ts.with_timezone(&Utc))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl LeadRecord {
    pub fn into_lead(self, fallback_query: &str) -> Lead {
        let scraped_at = self
            .scraped_date
            .as_deref()
            .and_then(parse_scraped_date)
            .unwrap_or_else(Utc::now);
        Lead {
            name: self.name.trim().to_string(),
            specialty: self.specialty.trim().to_string(),
            address: self.address.trim().to_string(),
            phone_number: non_blank(self.phone),
            email: non_blank(self.email),
            scraped_at,
            search_query: non_blank(self.search_query).unwrap_or_else(|| fallback_query.to_string()),
        }
    }
}

/// Reads leads from CSV. Rows that fail to parse or have no name are logged
/// and skipped.
pub fn read_leads<R: Read>(reader: R, fallback_query: &str) -> Vec<Lead> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut leads = Vec::new();
    for (i, result) in rdr.deserialize::<LeadRecord>().enumerate() {
        match result {
            Ok(record) if record.name.trim().is_empty() => {
                warn!("Skipping row {}: missing name", i + 1);
            }
            Ok(record) => leads.push(record.into_lead(fallback_query)),
            Err(e) => error!("Error parsing CSV record: {}", e),
        }
    }
    leads
}

pub fn load_leads<P: AsRef<Path>>(path: P, fallback_query: &str) -> std::io::Result<Vec<Lead>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let leads = read_leads(file, fallback_query);
    info!("Loaded {} leads from CSV {:?}", leads.len(), path);
    Ok(leads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{leads_to_csv, CsvLayout};

    #[test]
    fn test_reads_archive_export() {
        let lead = Lead {
            name: "Gupta Hardware".to_string(),
            specialty: "Hardware Store".to_string(),
            address: "3, Ring Road, Delhi".to_string(),
            phone_number: Some("+91 9811111111".to_string()),
            email: None,
            scraped_at: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
            search_query: "Hardware in Delhi".to_string(),
        };
        let csv = leads_to_csv(&[lead.clone()], CsvLayout::Archive).unwrap();

        let leads = read_leads(csv.as_bytes(), "imported");
        assert_eq!(leads, vec![lead]);
    }

    #[test]
    fn test_header_aliases_and_fallbacks() {
        let data = "Business Name,Type,Address,Phone\n\
                    Rao Tutors,Tutor,\"5, MG Road, Pune\",\n\
                    ,Tutor,nowhere,123\n";
        let leads = read_leads(data.as_bytes(), "upload.csv");
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Rao Tutors");
        assert_eq!(leads[0].address, "5, MG Road, Pune");
        assert!(leads[0].phone_number.is_none());
        assert_eq!(leads[0].search_query, "upload.csv");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_leads("/definitely/not/here.csv", "x").is_err());
    }
}
