// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pitchdesk_app::{Proposal, ProposalDraft, ProposalId, ProposalStatus};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

pub const APP_NAME: &str = "pitchdesk";

const PROPOSAL_COLUMNS: &str = "
  id, client_name, client_email, title, tags, status,
  amount_cents, created_at, updated_at
";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "proposals",
    &[
        "id",
        "client_name",
        "client_email",
        "title",
        "tags",
        "status",
        "amount_cents",
        "created_at",
        "updated_at",
        "deleted_at",
    ],
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_proposals_deleted_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_proposals_deleted_at ON proposals (deleted_at);",
    },
    RequiredIndex {
        name: "idx_proposals_client_name",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_proposals_client_name ON proposals (client_name);",
    },
];

struct DemoProposal {
    client_name: &'static str,
    client_email: Option<&'static str>,
    title: &'static str,
    tags: &'static [&'static str],
    status: ProposalStatus,
    amount_cents: Option<i64>,
}

const DEMO_PROPOSALS: &[DemoProposal] = &[
    DemoProposal {
        client_name: "Acme Corp",
        client_email: Some("procurement@acme.example"),
        title: "Website redesign",
        tags: &["web", "design"],
        status: ProposalStatus::Sent,
        amount_cents: Some(1_850_000),
    },
    DemoProposal {
        client_name: "Globex",
        client_email: None,
        title: "Mobile app discovery sprint",
        tags: &["mobile", "discovery"],
        status: ProposalStatus::Draft,
        amount_cents: Some(640_000),
    },
    DemoProposal {
        client_name: "Initech",
        client_email: Some("bill.lumbergh@initech.example"),
        title: "TPS report automation",
        tags: &["automation", "retainer"],
        status: ProposalStatus::Accepted,
        amount_cents: Some(2_400_000),
    },
    DemoProposal {
        client_name: "Umbrella Health",
        client_email: Some("it@umbrella.example"),
        title: "Patient portal accessibility audit",
        tags: &["web", "accessibility", "audit"],
        status: ProposalStatus::Draft,
        amount_cents: Some(975_000),
    },
    DemoProposal {
        client_name: "Hooli",
        client_email: Some("partners@hooli.example"),
        title: "Data platform migration",
        tags: &["data", "migration"],
        status: ProposalStatus::Declined,
        amount_cents: Some(5_200_000),
    },
    DemoProposal {
        client_name: "Stark Logistics",
        client_email: Some("ops@stark.example"),
        title: "Fleet tracking dashboard",
        tags: &["web", "data", "retainer"],
        status: ProposalStatus::Sent,
        amount_cents: None,
    },
];

/// Fields needed to insert a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProposal {
    pub client_name: String,
    pub client_email: Option<String>,
    pub title: String,
    pub tags: Vec<String>,
    pub status: ProposalStatus,
    pub amount_cents: Option<i64>,
}

impl From<ProposalDraft> for NewProposal {
    fn from(draft: ProposalDraft) -> Self {
        Self {
            client_name: draft.client_name,
            client_email: draft.client_email,
            title: draft.title,
            tags: draft.tags,
            status: ProposalStatus::Draft,
            amount_cents: draft.amount_cents,
        }
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        tracing::debug!(path = %path.display(), "opened proposal store");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            tracing::info!("created proposal schema");
        }

        ensure_required_indexes(&self.conn)
    }

    /// Inserts the demo set into an empty store. Returns how many rows were added.
    pub fn seed_demo_data(&self) -> Result<usize> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM proposals", [], |row| row.get(0))
            .context("count proposals before seeding")?;
        if existing > 0 {
            return Ok(0);
        }

        for demo in DEMO_PROPOSALS {
            self.create_proposal(&NewProposal {
                client_name: demo.client_name.to_owned(),
                client_email: demo.client_email.map(str::to_owned),
                title: demo.title.to_owned(),
                tags: demo.tags.iter().map(|tag| (*tag).to_owned()).collect(),
                status: demo.status,
                amount_cents: demo.amount_cents,
            })
            .with_context(|| format!("seed demo proposal for {}", demo.client_name))?;
        }
        Ok(DEMO_PROPOSALS.len())
    }

    pub fn create_proposal(&self, new_proposal: &NewProposal) -> Result<ProposalId> {
        if new_proposal.client_name.trim().is_empty() {
            bail!("client name is required -- enter a name and retry");
        }
        if new_proposal.title.trim().is_empty() {
            bail!("proposal title is required -- enter a title and retry");
        }
        if let Some(amount) = new_proposal.amount_cents
            && amount < 0
        {
            bail!("proposal amount cannot be negative");
        }

        let now = now_timestamp()?;
        let tags = serde_json::to_string(&new_proposal.tags).context("encode proposal tags")?;
        self.conn
            .execute(
                "
                INSERT INTO proposals (
                  client_name, client_email, title, tags, status,
                  amount_cents, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    new_proposal.client_name,
                    new_proposal.client_email,
                    new_proposal.title,
                    tags,
                    new_proposal.status.as_str(),
                    new_proposal.amount_cents,
                    now,
                    now,
                ],
            )
            .context("insert proposal")?;

        let proposal_id = ProposalId::new(self.conn.last_insert_rowid());
        tracing::debug!(proposal_id = proposal_id.get(), "inserted proposal");
        Ok(proposal_id)
    }

    pub fn get_proposal(&self, proposal_id: ProposalId) -> Result<Proposal> {
        let sql = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = ? AND deleted_at IS NULL"
        );
        self.conn
            .query_row(&sql, params![proposal_id.get()], proposal_from_row)
            .optional()
            .with_context(|| format!("load proposal {proposal_id}"))?
            .ok_or_else(|| anyhow!("proposal {proposal_id} not found or deleted"))
    }

    pub fn list_proposals(&self) -> Result<Vec<Proposal>> {
        let sql = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals
            WHERE deleted_at IS NULL
            ORDER BY julianday(updated_at) DESC, updated_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare proposals query")?;
        let rows = stmt
            .query_map([], proposal_from_row)
            .context("query proposals")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect proposals")
    }

    pub fn delete_proposal(&self, proposal_id: ProposalId) -> Result<()> {
        let now = now_timestamp()?;
        let rows_affected = self
            .conn
            .execute(
                "UPDATE proposals SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
                params![now, now, proposal_id.get()],
            )
            .with_context(|| format!("soft delete proposal {proposal_id}"))?;
        if rows_affected == 0 {
            bail!("proposal {proposal_id} not found or already deleted");
        }
        Ok(())
    }
}

fn proposal_from_row(row: &Row<'_>) -> rusqlite::Result<Proposal> {
    let tags_raw: String = row.get(4)?;
    let tags: Vec<String> = serde_json::from_str(&tags_raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    let status_raw: String = row.get(5)?;
    let status = ProposalStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown proposal status {status_raw}"),
            )),
        )
    })?;

    let created_at_raw: String = row.get(7)?;
    let updated_at_raw: String = row.get(8)?;

    Ok(Proposal {
        id: ProposalId::new(row.get(0)?),
        client_name: row.get(1)?,
        client_email: row.get(2)?,
        title: row.get(3)?,
        tags,
        status,
        amount_cents: row.get(6)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("PITCHDESK_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set PITCHDESK_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("pitchdesk.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a pitchdesk database or pick another path"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

// Fixed-width UTC so stored timestamps also sort correctly as text.
fn now_timestamp() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
        ))
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
