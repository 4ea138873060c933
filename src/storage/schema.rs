//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the crawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawled host
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hostname TEXT NOT NULL UNIQUE,
    visited_at TEXT,
    robots_txt TEXT,
    robots_txt_updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_domains_visited_at ON domains(visited_at);

-- One row per crawl target; the fingerprint is the uniqueness index
CREATE TABLE IF NOT EXISTS urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL CHECK (length(url) <= 5000),
    fingerprint TEXT NOT NULL UNIQUE,
    domain_id INTEGER NOT NULL REFERENCES domains(id),
    visited_at TEXT,
    content TEXT
);

CREATE INDEX IF NOT EXISTS idx_urls_domain ON urls(domain_id);
CREATE INDEX IF NOT EXISTS idx_urls_visited_at ON urls(visited_at);

-- Directed link graph; edges vanish with either endpoint
CREATE TABLE IF NOT EXISTS links (
    from_url_id INTEGER NOT NULL REFERENCES urls(id) ON DELETE CASCADE,
    to_url_id INTEGER NOT NULL REFERENCES urls(id) ON DELETE CASCADE,
    PRIMARY KEY (from_url_id, to_url_id)
);

CREATE INDEX IF NOT EXISTS idx_links_to ON links(to_url_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
