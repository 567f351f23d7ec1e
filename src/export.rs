//! CSV download and printable HTML view of leads.

use chrono::{DateTime, Local, NaiveDate, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::lead::Lead;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer error: {0}")]
    Buffer(String),
}

/// Column sets for CSV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// What the search page downloads.
    Results,
    /// Saved leads, with the query that produced them. Re-importable.
    Archive,
}

impl CsvLayout {
    fn headers(self) -> &'static [&'static str] {
        match self {
            CsvLayout::Results => &["Name", "Specialty", "Address", "Phone Number", "Scraped Date"],
            CsvLayout::Archive => &["Name", "Specialty", "Address", "Phone Number", "Scraped Date", "Search Query"],
        }
    }
}

pub fn format_scraped_date(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(DATE_FORMAT).to_string()
}

/// Header row plus one row per lead. Every field is quoted.
pub fn leads_to_csv<T: AsRef<Lead>>(leads: &[T], layout: CsvLayout) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(layout.headers())?;
    for lead in leads {
        let lead = lead.as_ref();
        let scraped = format_scraped_date(&lead.scraped_at);
        let mut row = vec![
            lead.name.as_str(),
            lead.specialty.as_str(),
            lead.address.as_str(),
            lead.phone_or_empty(),
            scraped.as_str(),
        ];
        if layout == CsvLayout::Archive {
            row.push(lead.search_query.as_str());
        }
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("business-leads-{}.csv", date.format("%Y-%m-%d"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Standalone HTML document listing the leads as a table.
pub fn render_print_view<T: AsRef<Lead>>(leads: &[T], search_query: Option<&str>, generated_at: DateTime<Local>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Business Leads</title>\n<style>\n\
         body { font-family: Arial, sans-serif; margin: 20px; }\n\
         table { width: 100%; border-collapse: collapse; }\n\
         th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }\n\
         th { background-color: #f2f2f2; }\n\
         .meta { color: #666; margin-bottom: 16px; }\n\
         </style>\n</head>\n<body>\n<h1>Business Leads</h1>\n<div class=\"meta\">\n",
    );
    html.push_str(&format!(
        "<p>Generated on: {}</p>\n",
        escape_html(&generated_at.format(DATE_FORMAT).to_string())
    ));
    if let Some(query) = search_query.filter(|q| !q.trim().is_empty()) {
        html.push_str(&format!("<p>Search query: {}</p>\n", escape_html(query)));
    }
    html.push_str(&format!("<p>Total leads: {}</p>\n</div>\n", leads.len()));

    html.push_str("<table>\n<thead><tr><th>Business Name</th><th>Type</th><th>Address</th><th>Phone</th></tr></thead>\n<tbody>\n");
    for lead in leads {
        let lead = lead.as_ref();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&lead.name),
            escape_html(&lead.specialty),
            escape_html(&lead.address),
            escape_html(lead.phone_number.as_deref().unwrap_or("N/A")),
        ));
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}
