use log::warn;
use regex::Regex;

use crate::lead::Lead;

/// Checks and normalizes the contact fields of leads that arrive from outside
/// (imports, uploads, external sources).
pub struct ContactValidator {
    email_regex: Regex,
    indian_phone_regex: Regex,
}

impl ContactValidator {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(ContactValidator {
            email_regex: Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$")?,
            // Optional country code, then ten digits not starting with 0.
            indian_phone_regex: Regex::new(r"^(?:\+?91)?([1-9]\d{9})$")?,
        })
    }

    /// `+91 <10 digits>` for Indian numbers; other numbers with 10 to 13
    /// digits are kept as written. Anything else is rejected.
    pub fn normalize_phone(&self, raw: &str) -> Option<String> {
        let compact: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();
        if let Some(caps) = self.indian_phone_regex.captures(&compact) {
            return caps.get(1).map(|m| format!("+91 {}", m.as_str()));
        }

        let digits = compact.chars().filter(|c| c.is_ascii_digit()).count();
        let only_digits = compact
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || (i == 0 && c == '+'));
        if only_digits && (10..=13).contains(&digits) {
            Some(raw.trim().to_string())
        } else {
            None
        }
    }

    pub fn is_valid_email(&self, raw: &str) -> bool {
        let email = raw.trim();
        self.email_regex.is_match(email)
            && ![".png", ".jpg", ".jpeg", ".gif", ".webp"]
                .iter()
                .any(|ext| email.to_lowercase().ends_with(ext))
    }

    /// Normalizes phone and email, dropping the ones that do not validate.
    pub fn sanitize(&self, mut lead: Lead) -> Lead {
        if let Some(raw) = lead.phone_number.take() {
            if raw.trim().is_empty() {
                lead.phone_number = None;
            } else {
                lead.phone_number = self.normalize_phone(&raw);
                if lead.phone_number.is_none() {
                    warn!("Dropping invalid phone '{}' for {}", raw, lead.name);
                }
            }
        }
        if let Some(raw) = lead.email.take() {
            if self.is_valid_email(&raw) {
                lead.email = Some(raw.trim().to_lowercase());
            } else if !raw.trim().is_empty() {
                warn!("Dropping invalid email '{}' for {}", raw, lead.name);
            }
        }
        lead
    }
}
