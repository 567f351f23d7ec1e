use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

use super::{LeadPage, LeadQuery, LeadStore, StoreError};
use crate::lead::{timestamp_key, Lead, StoredLead};
use crate::leads::SortDirection;

// A missing phone is stored as '' so the unique key covers it.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS leads (
    id           TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    name         TEXT NOT NULL,
    specialty    TEXT NOT NULL,
    address      TEXT NOT NULL,
    phone        TEXT NOT NULL DEFAULT '',
    email        TEXT,
    scraped_at   TEXT NOT NULL,
    search_query TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE (user_id, name, phone)
);
CREATE INDEX IF NOT EXISTS leads_user_scraped ON leads (user_id, scraped_at);
CREATE INDEX IF NOT EXISTS leads_user_query ON leads (user_id, search_query);
";

const COLUMNS: &str = "id, user_id, name, specialty, address, phone, email, scraped_at, search_query, created_at";

/// LeadStore backed by rusqlite (bundled SQLite).
pub struct SqliteLeadStore {
    conn: Mutex<Connection>,
}

impl SqliteLeadStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened lead database at {:?}", path);
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        // SQLite's lower() only folds ASCII; text filters need the same folding as Rust.
        conn.create_scalar_function(
            "ulower",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let value: Option<String> = ctx.get(0)?;
                Ok(value.map(|v| v.to_lowercase()))
            },
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_lead(row: &Row) -> rusqlite::Result<StoredLead> {
    let phone: String = row.get(5)?;
    Ok(StoredLead {
        id: row.get(0)?,
        user_id: row.get(1)?,
        lead: Lead {
            name: row.get(2)?,
            specialty: row.get(3)?,
            address: row.get(4)?,
            phone_number: if phone.is_empty() { None } else { Some(phone) },
            email: row.get(6)?,
            scraped_at: parse_timestamp(7, row.get(7)?)?,
            search_query: row.get(8)?,
        },
        created_at: parse_timestamp(9, row.get(9)?)?,
    })
}

fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// WHERE clause and bound values for the filter part of a query.
fn filter_clause(user_id: &str, query: &LeadQuery) -> (String, Vec<Value>) {
    let mut clauses = vec!["user_id = ?".to_string()];
    let mut values = vec![Value::Text(user_id.to_string())];

    if let Some(specialty) = &query.specialty {
        clauses.push("specialty = ?".to_string());
        values.push(Value::Text(specialty.clone()));
    }
    if let Some(search_query) = &query.search_query {
        clauses.push("search_query = ?".to_string());
        values.push(Value::Text(search_query.clone()));
    }
    if let Some(term) = query.text_filter() {
        clauses.push(
            "(ulower(name) LIKE ? ESCAPE '\\' OR ulower(address) LIKE ? ESCAPE '\\' \
             OR ulower(specialty) LIKE ? ESCAPE '\\' OR ulower(phone) LIKE ? ESCAPE '\\')"
                .to_string(),
        );
        let pattern = like_pattern(&term);
        for _ in 0..4 {
            values.push(Value::Text(pattern.clone()));
        }
    }
    (clauses.join(" AND "), values)
}

impl LeadStore for SqliteLeadStore {
    fn save_leads(&self, user_id: &str, leads: &[Lead]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let created_at = timestamp_key(&Utc::now());
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO leads ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ))?;
            for lead in leads {
                let changed = stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    user_id,
                    lead.name,
                    lead.specialty,
                    lead.address,
                    lead.phone_or_empty(),
                    lead.email,
                    timestamp_key(&lead.scraped_at),
                    lead.search_query,
                    created_at,
                ])?;
                if changed == 0 {
                    info!("Skipped duplicate lead: {}", lead.name);
                }
                inserted += changed;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn query(&self, user_id: &str, query: &LeadQuery) -> Result<LeadPage, StoreError> {
        let conn = self.conn()?;
        let (where_sql, mut values) = filter_clause(user_id, query);

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM leads WHERE {where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let column = query.sort.column();
        let direction = query.direction.sql();
        let mut page_where = where_sql;
        if let Some(cursor) = &query.after {
            let op = match query.direction {
                SortDirection::Ascending => ">",
                SortDirection::Descending => "<",
            };
            page_where.push_str(&format!(" AND ({column} {op} ? OR ({column} = ? AND id {op} ?))"));
            values.push(Value::Text(cursor.sort_value.clone()));
            values.push(Value::Text(cursor.sort_value.clone()));
            values.push(Value::Text(cursor.id.clone()));
        }
        values.push(Value::Integer(i64::try_from(query.page_size()).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(query.offset()).unwrap_or(i64::MAX)));

        let sql = format!(
            "SELECT {COLUMNS} FROM leads WHERE {page_where} \
             ORDER BY {column} {direction}, id {direction} LIMIT ? OFFSET ?"
        );
        debug!("lead page query: {}", sql);

        let mut stmt = conn.prepare(&sql)?;
        let data = stmt
            .query_map(params_from_iter(values.iter()), row_to_lead)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LeadPage::new(data, count as usize, query))
    }

    fn count(&self, user_id: &str) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM leads WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn by_search_query(&self, user_id: &str, search_query: &str) -> Result<Vec<StoredLead>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM leads WHERE user_id = ?1 AND search_query = ?2 \
             ORDER BY scraped_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![user_id, search_query], row_to_lead)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn specialties(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT specialty FROM leads WHERE user_id = ?1 ORDER BY specialty")?;
        let rows = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }
}
