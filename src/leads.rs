use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::lead::{timestamp_key, Lead, StoredLead};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Specialty,
    Address,
    #[serde(alias = "phone")]
    PhoneNumber,
    #[default]
    ScrapedAt,
}

impl SortKey {
    pub fn column(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Specialty => "specialty",
            SortKey::Address => "address",
            SortKey::PhoneNumber => "phone",
            SortKey::ScrapedAt => "scraped_at",
        }
    }

    /// Text the lead sorts by under this key. Timestamps use the fixed-width
    /// form so string order matches time order.
    pub fn value_of(self, lead: &Lead) -> String {
        match self {
            SortKey::Name => lead.name.clone(),
            SortKey::Specialty => lead.specialty.clone(),
            SortKey::Address => lead.address.clone(),
            SortKey::PhoneNumber => lead.phone_or_empty().to_string(),
            SortKey::ScrapedAt => timestamp_key(&lead.scraped_at),
        }
    }

    fn compare(self, a: &Lead, b: &Lead) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Specialty => a.specialty.cmp(&b.specialty),
            SortKey::Address => a.address.cmp(&b.address),
            SortKey::PhoneNumber => a.phone_or_empty().cmp(b.phone_or_empty()),
            SortKey::ScrapedAt => a.scraped_at.cmp(&b.scraped_at),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "specialty" => Ok(SortKey::Specialty),
            "address" => Ok(SortKey::Address),
            "phone" | "phonenumber" | "phone_number" => Ok(SortKey::PhoneNumber),
            "scrapedat" | "scraped_at" | "date" => Ok(SortKey::ScrapedAt),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[default]
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        })
    }
}

/// Column sort state of a results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    /// Clicking a column: the same key while ascending flips to descending,
    /// anything else starts ascending.
    pub fn toggle(current: Option<SortState>, key: SortKey) -> SortState {
        let direction = match current {
            Some(state) if state.key == key && state.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        SortState { key, direction }
    }
}

/// Case-insensitive match over name, address, specialty and phone.
pub fn matches_text(lead: &Lead, term: &str) -> bool {
    let term = term.to_lowercase();
    if term.is_empty() {
        return true;
    }
    lead.name.to_lowercase().contains(&term)
        || lead.address.to_lowercase().contains(&term)
        || lead.specialty.to_lowercase().contains(&term)
        || lead
            .phone_number
            .as_deref()
            .map_or(false, |p| p.to_lowercase().contains(&term))
}

pub fn filter_text<T: AsRef<Lead> + Clone>(items: &[T], term: &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| matches_text(item.as_ref(), term))
        .cloned()
        .collect()
}

pub fn sort_leads<T: AsRef<Lead>>(items: &mut [T], state: SortState) {
    items.sort_by(|a, b| state.direction.apply(state.key.compare(a.as_ref(), b.as_ref())));
}

/// Ordering used by the stores: the sort key, then the row id as tie-breaker,
/// both in the requested direction.
pub fn compare_stored(a: &StoredLead, b: &StoredLead, state: SortState) -> Ordering {
    state
        .direction
        .apply(state.key.compare(&a.lead, &b.lead).then_with(|| a.id.cmp(&b.id)))
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// One page (1-based) of `items`. Out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if page_size == 0 || start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// How a results table shows a batch of leads: text filter, column sort and
/// optional paging, applied in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsView {
    pub filter: String,
    pub sort: Option<SortState>,
    /// 1-based page and page size. `None` shows every match.
    pub page: Option<(usize, usize)>,
}

impl ResultsView {
    /// Replays column header clicks in order.
    pub fn click_columns(mut self, keys: &[SortKey]) -> Self {
        self.sort = keys
            .iter()
            .fold(self.sort, |state, &key| Some(SortState::toggle(state, key)));
        self
    }

    pub fn apply<T: AsRef<Lead> + Clone>(&self, items: &[T]) -> Vec<T> {
        let mut shown = filter_text(items, &self.filter);
        if let Some(state) = self.sort {
            sort_leads(&mut shown, state);
        }
        match self.page {
            Some((page, page_size)) => paginate(&shown, page, page_size).to_vec(),
            None => shown,
        }
    }
}

/// Drops later records whose (name, phone) pair was already seen.
pub fn dedup_by_name_phone<T: AsRef<Lead>>(items: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let (name, phone) = item.as_ref().dedup_key();
            seen.insert((name.to_string(), phone.to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentQuery {
    pub search_query: String,
    pub specialty: String,
    pub scraped_at: chrono::DateTime<chrono::Utc>,
}

/// Dashboard figures for one user's leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total_unique_leads: usize,
    pub unique_phone_numbers: usize,
    pub unique_queries: usize,
    pub recent_queries: Vec<RecentQuery>,
}

const RECENT_QUERY_LIMIT: usize = 5;

impl LeadStats {
    pub fn from_leads<T: AsRef<Lead>>(items: &[T]) -> Self {
        let mut keys = HashSet::new();
        let mut phones = HashSet::new();
        let mut total_unique_leads = 0;
        for item in items {
            let lead = item.as_ref();
            if keys.insert(lead.dedup_key()) {
                total_unique_leads += 1;
                if let Some(phone) = lead.phone_number.as_deref() {
                    phones.insert(phone);
                }
            }
        }

        let mut by_date: Vec<&Lead> = items.iter().map(|i| i.as_ref()).collect();
        by_date.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));

        let mut queries = HashSet::new();
        let mut recent_queries = Vec::new();
        for lead in by_date {
            if queries.insert(lead.search_query.as_str()) && recent_queries.len() < RECENT_QUERY_LIMIT {
                recent_queries.push(RecentQuery {
                    search_query: lead.search_query.clone(),
                    specialty: lead.specialty.clone(),
                    scraped_at: lead.scraped_at,
                });
            }
        }

        LeadStats {
            total_unique_leads,
            unique_phone_numbers: phones.len(),
            unique_queries: queries.len(),
            recent_queries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn lead(name: &str, phone: Option<&str>, minutes: i64) -> Lead {
        Lead {
            name: name.to_string(),
            specialty: "Dentist".to_string(),
            address: format!("1, MG Road, {} Mumbai", name),
            phone_number: phone.map(str::to_string),
            email: None,
            scraped_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + Duration::minutes(minutes),
            search_query: format!("Dentist in {}", name),
        }
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let leads = vec![
            lead("Sharma Dental", Some("+91 9800000001"), 0),
            lead("Patel Clinic", Some("+91 9800000002"), 1),
        ];
        let found = filter_text(&leads, "SHARMA");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Sharma Dental");
        assert_eq!(filter_text(&leads, "9800000002").len(), 1);
        assert_eq!(filter_text(&leads, "").len(), 2);
    }

    #[test]
    fn test_sort_toggle_and_order() {
        let first = SortState::toggle(None, SortKey::Name);
        assert_eq!(first.direction, SortDirection::Ascending);
        let second = SortState::toggle(Some(first), SortKey::Name);
        assert_eq!(second.direction, SortDirection::Descending);
        let other = SortState::toggle(Some(second), SortKey::Address);
        assert_eq!(other.direction, SortDirection::Ascending);

        let mut leads = vec![lead("B", None, 2), lead("A", None, 1), lead("C", None, 0)];
        sort_leads(&mut leads, first);
        let names: Vec<_> = leads.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        sort_leads(&mut leads, SortState { key: SortKey::ScrapedAt, direction: SortDirection::Descending });
        let names: Vec<_> = leads.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_pagination_covers_every_record_once() {
        let items: Vec<usize> = (0..23).collect();
        let pages = total_pages(items.len(), 5);
        assert_eq!(pages, 5);

        let mut joined = Vec::new();
        for page in 1..=pages {
            let slice = paginate(&items, page, 5);
            assert!(slice.len() <= 5);
            joined.extend_from_slice(slice);
        }
        assert_eq!(joined, items);
        assert!(paginate(&items, 6, 5).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
    }

    #[test]
    fn test_results_view() {
        let leads = vec![
            lead("Sharma Dental", None, 0),
            lead("Patel Dental", None, 1),
            lead("Iyer Clinic", None, 2),
            lead("Mehta Dental", None, 3),
        ];

        let view = ResultsView {
            filter: "dental".to_string(),
            ..ResultsView::default()
        };
        let names: Vec<_> = view.apply(&leads).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Sharma Dental", "Patel Dental", "Mehta Dental"]);

        let view = view.click_columns(&[SortKey::Name]);
        let names: Vec<_> = view.apply(&leads).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Mehta Dental", "Patel Dental", "Sharma Dental"]);

        // Second click on the same column flips to descending.
        let view = ResultsView {
            page: Some((1, 2)),
            ..view.click_columns(&[SortKey::Name])
        };
        let names: Vec<_> = view.apply(&leads).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Sharma Dental", "Patel Dental"]);

        let last = ResultsView {
            page: Some((2, 2)),
            ..view
        };
        assert_eq!(last.apply(&leads).len(), 1);
    }

    #[test]
    fn test_dedup_keeps_first_and_is_idempotent() {
        let leads = vec![
            lead("Sharma Dental", Some("+91 9800000001"), 0),
            lead("Sharma Dental", Some("+91 9800000002"), 1),
            lead("Sharma Dental", Some("+91 9800000001"), 2),
            lead("Patel Clinic", None, 3),
            lead("Patel Clinic", None, 4),
        ];
        let once = dedup_by_name_phone(leads);
        assert_eq!(once.len(), 3);
        assert_eq!(once[0].scraped_at, lead("x", None, 0).scraped_at);
        let twice = dedup_by_name_phone(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_stats() {
        let mut leads = vec![
            lead("A", Some("+91 9800000001"), 0),
            lead("A", Some("+91 9800000001"), 1),
            lead("B", Some("+91 9800000002"), 2),
            lead("C", None, 3),
        ];
        leads[1].search_query = leads[0].search_query.clone();
        let stats = LeadStats::from_leads(&leads);
        assert_eq!(stats.total_unique_leads, 3);
        assert_eq!(stats.unique_phone_numbers, 2);
        assert_eq!(stats.unique_queries, 3);
        assert_eq!(stats.recent_queries[0].search_query, "Dentist in C");
    }

    #[test]
    fn test_parse_sort_options() {
        assert_eq!("phoneNumber".parse::<SortKey>().unwrap(), SortKey::PhoneNumber);
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
