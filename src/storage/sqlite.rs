//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{Domain, UrlRecord, UrlStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{format_timestamp, parse_timestamp, LinkRecord};
use crate::url::fingerprint;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const DOMAIN_COLUMNS: &str = "id, hostname, visited_at, robots_txt, robots_txt_updated_at";

const URL_COLUMNS: &str = "u.id, u.url, u.fingerprint, u.domain_id, u.visited_at, u.content";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and applies the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_url(&self, sql: &str, params: impl rusqlite::Params) -> StorageResult<Option<UrlRecord>> {
        let url = self
            .conn
            .query_row(sql, params, row_to_url)
            .optional()?;
        Ok(url)
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn query_links(&self, sql: &str, url_id: i64) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(sql)?;

        let links = stmt
            .query_map(params![url_id], |row| {
                Ok(LinkRecord {
                    from_url_id: row.get(0)?,
                    to_url_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }
}

/// Reads an optional timestamp column, surfacing malformed values as conversion errors
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        parse_timestamp(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn row_to_domain(row: &Row<'_>) -> rusqlite::Result<Domain> {
    Ok(Domain {
        id: row.get(0)?,
        hostname: row.get(1)?,
        visited_at: timestamp_column(row, 2)?,
        robots_txt: row.get(3)?,
        robots_txt_updated_at: timestamp_column(row, 4)?,
    })
}

fn row_to_url(row: &Row<'_>) -> rusqlite::Result<UrlRecord> {
    Ok(UrlRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        fingerprint: row.get(2)?,
        domain_id: row.get(3)?,
        visited_at: timestamp_column(row, 4)?,
        content: row.get(5)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Domains =====

    fn upsert_domain(&mut self, hostname: &str) -> StorageResult<Domain> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO domains (hostname) VALUES (?1)",
            params![hostname],
        )?;
        if inserted > 0 {
            tracing::debug!("Created domain {}", hostname);
        }

        self.get_domain_by_hostname(hostname)?
            .ok_or_else(|| StorageError::DomainNotFound(hostname.to_string()))
    }

    fn get_domain(&self, domain_id: i64) -> StorageResult<Domain> {
        let sql = format!("SELECT {} FROM domains WHERE id = ?1", DOMAIN_COLUMNS);
        self.conn
            .query_row(&sql, params![domain_id], row_to_domain)
            .optional()?
            .ok_or_else(|| StorageError::DomainNotFound(format!("Domain ID {}", domain_id)))
    }

    fn get_domain_by_hostname(&self, hostname: &str) -> StorageResult<Option<Domain>> {
        let sql = format!("SELECT {} FROM domains WHERE hostname = ?1", DOMAIN_COLUMNS);
        let domain = self
            .conn
            .query_row(&sql, params![hostname], row_to_domain)
            .optional()?;
        Ok(domain)
    }

    fn set_domain_visited(&mut self, domain_id: i64, at: DateTime<Utc>) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE domains SET visited_at = ?1 WHERE id = ?2",
            params![format_timestamp(at), domain_id],
        )?;
        if changed == 0 {
            return Err(StorageError::DomainNotFound(format!("Domain ID {}", domain_id)));
        }
        Ok(())
    }

    fn set_domain_robots(
        &mut self,
        domain_id: i64,
        robots_txt: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE domains SET robots_txt = ?1, robots_txt_updated_at = ?2 WHERE id = ?3",
            params![robots_txt, format_timestamp(at), domain_id],
        )?;
        if changed == 0 {
            return Err(StorageError::DomainNotFound(format!("Domain ID {}", domain_id)));
        }
        Ok(())
    }

    // ===== Urls =====

    fn upsert_url(&mut self, url: &str, domain_id: i64) -> StorageResult<(UrlRecord, bool)> {
        let fp = fingerprint(url);
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO urls (url, fingerprint, domain_id) VALUES (?1, ?2, ?3)",
            params![url, fp, domain_id],
        )?;

        let sql = format!("SELECT {} FROM urls u WHERE u.fingerprint = ?1", URL_COLUMNS);
        let record = self
            .query_url(&sql, params![fp])?
            .ok_or_else(|| StorageError::UrlNotFound(url.to_string()))?;

        Ok((record, inserted > 0))
    }

    fn get_url(&self, url_id: i64) -> StorageResult<UrlRecord> {
        let sql = format!("SELECT {} FROM urls u WHERE u.id = ?1", URL_COLUMNS);
        self.query_url(&sql, params![url_id])?
            .ok_or_else(|| StorageError::UrlNotFound(format!("Url ID {}", url_id)))
    }

    fn get_url_by_url(&self, url: &str) -> StorageResult<Option<UrlRecord>> {
        let sql = format!("SELECT {} FROM urls u WHERE u.fingerprint = ?1", URL_COLUMNS);
        self.query_url(&sql, params![fingerprint(url)])
    }

    fn url_exists(&self, url: &str) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM urls WHERE fingerprint = ?1)",
            params![fingerprint(url)],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn delete_url(&mut self, url_id: i64) -> StorageResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM urls WHERE id = ?1", params![url_id])?;
        if changed == 0 {
            return Err(StorageError::UrlNotFound(format!("Url ID {}", url_id)));
        }
        Ok(())
    }

    fn set_url_visited(&mut self, url_id: i64, at: DateTime<Utc>) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE urls SET visited_at = ?1 WHERE id = ?2",
            params![format_timestamp(at), url_id],
        )?;
        if changed == 0 {
            return Err(StorageError::UrlNotFound(format!("Url ID {}", url_id)));
        }
        Ok(())
    }

    fn set_url_content(
        &mut self,
        url_id: i64,
        content: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE urls SET content = ?1, visited_at = ?2 WHERE id = ?3",
            params![content, format_timestamp(at), url_id],
        )?;
        if changed == 0 {
            return Err(StorageError::UrlNotFound(format!("Url ID {}", url_id)));
        }
        Ok(())
    }

    // ===== Link Graph =====

    fn insert_link(&mut self, from_url_id: i64, to_url_id: i64) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO links (from_url_id, to_url_id) VALUES (?1, ?2)",
            params![from_url_id, to_url_id],
        )?;
        Ok(inserted > 0)
    }

    fn get_outgoing_links(&self, url_id: i64) -> StorageResult<Vec<LinkRecord>> {
        self.query_links(
            "SELECT from_url_id, to_url_id FROM links WHERE from_url_id = ?1 ORDER BY to_url_id",
            url_id,
        )
    }

    fn get_incoming_links(&self, url_id: i64) -> StorageResult<Vec<LinkRecord>> {
        self.query_links(
            "SELECT from_url_id, to_url_id FROM links WHERE to_url_id = ?1 ORDER BY from_url_id",
            url_id,
        )
    }

    fn count_links(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM links")
    }

    // ===== Frontier Queries =====

    fn next_url_on_unvisited_domain(&self) -> StorageResult<Option<UrlRecord>> {
        let sql = format!(
            "SELECT {} FROM urls u JOIN domains d ON d.id = u.domain_id
             WHERE u.visited_at IS NULL AND d.visited_at IS NULL
             ORDER BY u.id ASC LIMIT 1",
            URL_COLUMNS
        );
        self.query_url(&sql, [])
    }

    fn next_unvisited_url(&self) -> StorageResult<Option<UrlRecord>> {
        let sql = format!(
            "SELECT {} FROM urls u JOIN domains d ON d.id = u.domain_id
             WHERE u.visited_at IS NULL
             ORDER BY d.visited_at ASC, u.id ASC LIMIT 1",
            URL_COLUMNS
        );
        self.query_url(&sql, [])
    }

    fn next_stale_url(&self, cutoff: DateTime<Utc>) -> StorageResult<Option<UrlRecord>> {
        let sql = format!(
            "SELECT {} FROM urls u JOIN domains d ON d.id = u.domain_id
             WHERE u.visited_at IS NOT NULL AND u.visited_at < ?1
             ORDER BY u.visited_at ASC, d.visited_at ASC, u.id ASC LIMIT 1",
            URL_COLUMNS
        );
        self.query_url(&sql, params![format_timestamp(cutoff)])
    }

    // ===== Statistics =====

    fn count_domains(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM domains")
    }

    fn count_visited_domains(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM domains WHERE visited_at IS NOT NULL")
    }

    fn count_urls(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM urls")
    }

    fn count_urls_by_status(&self, status: UrlStatus) -> StorageResult<u64> {
        let sql = match status {
            UrlStatus::Unvisited => "SELECT COUNT(*) FROM urls WHERE visited_at IS NULL",
            UrlStatus::Crawled => {
                "SELECT COUNT(*) FROM urls WHERE visited_at IS NOT NULL AND content IS NOT NULL"
            }
            UrlStatus::Attempted => {
                "SELECT COUNT(*) FROM urls WHERE visited_at IS NOT NULL AND content IS NULL"
            }
        };
        self.count(sql)
    }
}
