//! Synthetic lead generation.
//!
//! Stands in for a real maps scrape: names come from per-category templates
//! filled with random words, addresses from per-city street tables, and phone
//! numbers follow the `+91 <10 digits>` national format.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{self, BUSINESS_CATEGORIES, DEFAULT_AREAS, DEFAULT_CATEGORY, EMAIL_DOMAINS, FIRST_NAMES, LAST_NAMES};
use crate::config::GeneratorConfig;
use crate::lead::Lead;
use crate::source::ScrollCount;

pub const QUERY_SEPARATOR: &str = " in ";
const CITY_FALLBACK: &str = "Premium";
const RESULTS_PER_SCROLL: usize = 3;
const EXTRA_RESULTS: usize = 5;
const EMAIL_LOCAL_MAX: usize = 20;

/// Splits `"<profession> in <location>"`. Without a separator the whole
/// query is the profession.
pub fn split_query(query: &str) -> (&str, &str) {
    match query.split_once(QUERY_SEPARATOR) {
        Some((profession, location)) => (profession.trim(), location.trim()),
        None => (query.trim(), ""),
    }
}

/// Category and canonical business type for a profession. Exact matches win;
/// otherwise the first case-insensitive partial match in either direction.
pub fn resolve_business_type(profession: &str) -> (&'static str, String) {
    for (category, types) in BUSINESS_CATEGORIES {
        if types.contains(&profession) {
            return (*category, profession.to_string());
        }
    }

    let wanted = profession.to_lowercase();
    if !wanted.is_empty() {
        for (category, types) in BUSINESS_CATEGORIES {
            for business_type in types.iter() {
                let candidate = business_type.to_lowercase();
                if candidate.contains(&wanted) || wanted.contains(&candidate) {
                    return (*category, business_type.to_string());
                }
            }
        }
    }

    (DEFAULT_CATEGORY, profession.to_string())
}

pub fn result_count<R: Rng + ?Sized>(scroll: Option<ScrollCount>, max_results: usize, rng: &mut R) -> usize {
    let pages = scroll.unwrap_or_default().pages() as usize;
    (pages * RESULTS_PER_SCROLL + rng.gen_range(0..EXTRA_RESULTS)).min(max_results)
}

fn pick<'a, R: Rng + ?Sized>(words: &[&'a str], rng: &mut R) -> &'a str {
    words.choose(rng).copied().unwrap_or("")
}

/// Fills every placeholder occurrence independently.
fn fill_template<R: Rng + ?Sized>(template: &str, business: &str, city: Option<&str>, rng: &mut R) -> String {
    let mut out = String::with_capacity(template.len() + business.len() + 16);
    let mut rest = template;
    while let Some(start) = rest.find('[') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(']') else {
            out.push_str(tail);
            return out;
        };
        match &tail[..=end] {
            "[FIRST]" => out.push_str(pick(FIRST_NAMES, rng)),
            "[LAST]" => out.push_str(pick(LAST_NAMES, rng)),
            "[CITY]" => out.push_str(city.unwrap_or(CITY_FALLBACK)),
            "[BUSINESS]" => out.push_str(business),
            other => out.push_str(other),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

fn synthesize_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("+91 {}", rng.gen_range(1_000_000_000u64..10_000_000_000u64))
}

/// Lower-case the name, keep word characters, join words with dots.
fn email_local_part(name: &str) -> String {
    let mut local = String::new();
    let mut pending_dot = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dot && !local.is_empty() {
                local.push('.');
            }
            pending_dot = false;
            local.push(c);
        } else if c.is_whitespace() {
            pending_dot = true;
        }
    }
    local.chars().take(EMAIL_LOCAL_MAX).collect()
}

fn synthesize_email<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    let local = email_local_part(name);
    let suffix: u32 = rng.gen_range(0..999);
    let domain = pick(EMAIL_DOMAINS, rng);
    if suffix > 50 {
        format!("{}{}@{}", local, suffix, domain)
    } else {
        format!("{}@{}", local, domain)
    }
}

pub struct LeadGenerator {
    max_results: usize,
    with_email: bool,
}

impl LeadGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        LeadGenerator {
            max_results: config.max_results,
            with_email: config.with_email,
        }
    }

    /// Leads for one query. Every call yields fresh random data.
    pub fn generate<R: Rng + ?Sized>(&self, query: &str, scroll: Option<ScrollCount>, rng: &mut R) -> Vec<Lead> {
        let (profession, location) = split_query(query);
        let (category, business_type) = resolve_business_type(profession);
        // Names read the way the user typed the profession; the canonical type is the specialty.
        let name_business = if profession.is_empty() { business_type.as_str() } else { profession };
        let city = catalog::find_city(location);
        let templates = catalog::name_templates(category);
        let streets = catalog::streets_for_city(city);

        let areas: Vec<&str> = if !location.is_empty() {
            vec![location]
        } else {
            let localities = city.map(catalog::localities_for_city).unwrap_or(&[]);
            if localities.is_empty() {
                DEFAULT_AREAS.to_vec()
            } else {
                localities.to_vec()
            }
        };

        let count = result_count(scroll, self.max_results, rng);
        log::debug!(
            "Generating {} leads for '{}' (type: {}, category: {})",
            count, query, business_type, category
        );

        (0..count)
            .map(|_| {
                let template = pick(templates, rng);
                let name = fill_template(template, name_business, city, rng);
                let building: u32 = rng.gen_range(1..=500);
                let street = pick(streets, rng);
                let area = pick(&areas, rng);
                let address = match city {
                    Some(city) => format!("{}, {}, {}, {}", building, street, area, city),
                    None => format!("{}, {}, {}", building, street, area),
                };
                let email = self.with_email.then(|| synthesize_email(&name, rng));
                Lead {
                    name,
                    specialty: business_type.clone(),
                    address,
                    phone_number: Some(synthesize_phone(rng)),
                    email,
                    scraped_at: Utc::now(),
                    search_query: query.to_string(),
                }
            })
            .collect()
    }
}
