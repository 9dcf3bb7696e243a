//! SQLite storage layer for the medical property graph.
//!
//! A [`GraphStore`] owns one `r2d2` connection pool for the lifetime of a
//! generation run. Workers borrow connections for individual hop queries;
//! the pool (and every connection in it) is released when the store drops.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, ErrorCode};
use tracing::{debug, info};

use crate::errors::{CorpusError, CorpusResult};
use crate::models::{EdgeRecord, HopClass, NodeLabel, NodeRecord, PathRecord, SeedEntity};
use crate::query::guards::{query_deadline, DEADLINE_CHECK_INTERVAL};
use crate::query::paths;
use crate::store::schema;
use crate::store::GraphSource;

const POOL_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

/// Create all tables and indexes.
pub fn init_schema(conn: &Connection) -> CorpusResult<()> {
    for stmt in schema::SCHEMA_STATEMENTS {
        conn.execute_batch(stmt)?;
    }
    Ok(())
}

/// Upsert a batch of nodes keyed by `(label, node_id)`.
pub fn insert_nodes(conn: &Connection, nodes: &[NodeRecord]) -> CorpusResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO nodes (label, node_id, name, description) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(label, node_id) DO UPDATE SET \
             name = excluded.name, \
             description = excluded.description;",
    )?;
    let mut written = 0;
    for node in nodes {
        written += stmt.execute(params![
            node.label.as_str(),
            node.id,
            node.name,
            node.description,
        ])?;
    }
    Ok(written)
}

/// Insert a batch of edges, ignoring exact duplicates.
pub fn insert_edges(conn: &Connection, edges: &[EdgeRecord]) -> CorpusResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO edges \
             (source_label, source_id, relationship, target_label, target_id) \
         VALUES (?1, ?2, ?3, ?4, ?5);",
    )?;
    let mut written = 0;
    for edge in edges {
        written += stmt.execute(params![
            edge.source_label.as_str(),
            edge.source_id,
            edge.relationship.as_str(),
            edge.target_label.as_str(),
            edge.target_id,
        ])?;
    }
    Ok(written)
}

/// All `Disease` nodes as seeds, in storage order.
pub fn select_seed_entities(conn: &Connection) -> CorpusResult<Vec<SeedEntity>> {
    let mut stmt = conn.prepare(
        "SELECT node_id, COALESCE(name, '') FROM nodes WHERE label = ?1 ORDER BY node_id;",
    )?;
    let rows = stmt.query_map(params![NodeLabel::Disease.as_str()], |row| {
        Ok(SeedEntity {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    let mut seeds = Vec::new();
    for seed in rows {
        seeds.push(seed?);
    }
    Ok(seeds)
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// Pooled SQLite graph store.
pub struct GraphStore {
    db_path: PathBuf,
    pool: Pool<SqliteConnectionManager>,
    query_timeout: Option<Duration>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("db_path", &self.db_path)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl GraphStore {
    /// Open an existing, initialised graph database.
    ///
    /// Fails with [`CorpusError::Connectivity`] when the file is missing, the
    /// pool cannot connect, or the schema has not been created.
    pub fn open(db_path: &Path, pool_size: u32, query_timeout_ms: u64) -> CorpusResult<Self> {
        if !db_path.exists() {
            return Err(CorpusError::Connectivity(format!(
                "graph database {} does not exist",
                db_path.display()
            )));
        }
        let store = Self::build(db_path, pool_size, query_timeout_ms)?;
        store.ping()?;
        info!(
            "Opened graph store {} (pool size {})",
            db_path.display(),
            pool_size.max(1)
        );
        Ok(store)
    }

    /// Create (or open) a database file and make sure the schema is current.
    pub fn create(db_path: &Path) -> CorpusResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self::build(db_path, 1, 0)?;
        store.init_schema()?;
        Ok(store)
    }

    fn build(db_path: &Path, pool_size: u32, query_timeout_ms: u64) -> CorpusResult<Self> {
        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(POOL_CONNECT_TIMEOUT)
            .build(manager)
            .map_err(|e| {
                CorpusError::Connectivity(format!("cannot open {}: {e}", db_path.display()))
            })?;
        Ok(Self {
            db_path: db_path.to_path_buf(),
            pool,
            query_timeout: query_deadline(query_timeout_ms),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> CorpusResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Cheap round trip proving the store is reachable and initialised.
    pub fn ping(&self) -> CorpusResult<()> {
        let conn = self
            .connect()
            .map_err(|e| CorpusError::Connectivity(e.to_string()))?;
        conn.query_row("SELECT COUNT(*) FROM nodes;", [], |row| row.get::<_, i64>(0))
            .map_err(|e| {
                CorpusError::Connectivity(format!(
                    "graph store {} is not initialised: {e}",
                    self.db_path.display()
                ))
            })?;
        Ok(())
    }

    pub fn init_schema(&self) -> CorpusResult<()> {
        let conn = self.connect()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        init_schema(&conn)
    }

    /// Upsert nodes in one transaction.
    pub fn upsert_nodes(&self, nodes: &[NodeRecord]) -> CorpusResult<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let written = insert_nodes(&tx, nodes)?;
        tx.commit()?;
        Ok(written)
    }

    /// Insert edges in one transaction.
    pub fn add_edges(&self, edges: &[EdgeRecord]) -> CorpusResult<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let written = insert_edges(&tx, edges)?;
        tx.commit()?;
        Ok(written)
    }

    pub fn count_nodes(&self, label: NodeLabel) -> CorpusResult<i64> {
        let conn = self.connect()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM nodes WHERE label = ?1;",
            params![label.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn query_error(hop: HopClass, seed_id: &str, message: String) -> CorpusError {
        CorpusError::Query {
            hop,
            seed_id: seed_id.to_string(),
            message,
        }
    }
}

impl GraphSource for GraphStore {
    fn list_seed_entities(&self) -> CorpusResult<Vec<SeedEntity>> {
        let conn = self
            .connect()
            .map_err(|e| CorpusError::Connectivity(e.to_string()))?;
        select_seed_entities(&conn).map_err(|e| CorpusError::Connectivity(e.to_string()))
    }

    fn run_hop_query(
        &self,
        hop: HopClass,
        seed_id: &str,
        limit: usize,
    ) -> CorpusResult<Vec<PathRecord>> {
        let records = self.with_deadline(hop, seed_id, |conn| {
            paths::run_hop_query(conn, hop, seed_id, limit)
        })?;
        debug!("{hop} query for {seed_id} returned {} records", records.len());
        Ok(records)
    }
}

impl GraphStore {
    /// Run `f` on a pooled connection under the per-query deadline. Every
    /// failure, including an expired deadline, comes back as
    /// [`CorpusError::Query`].
    fn with_deadline<T>(
        &self,
        hop: HopClass,
        seed_id: &str,
        f: impl FnOnce(&Connection) -> CorpusResult<T>,
    ) -> CorpusResult<T> {
        let conn = self
            .connect()
            .map_err(|e| Self::query_error(hop, seed_id, e.to_string()))?;

        if let Some(timeout) = self.query_timeout {
            let started = Instant::now();
            conn.progress_handler(
                DEADLINE_CHECK_INTERVAL,
                Some(move || started.elapsed() > timeout),
            );
        }
        let result = f(&conn);
        if self.query_timeout.is_some() {
            // Pooled connections are reused; never leak a stale deadline.
            conn.progress_handler(0, None::<fn() -> bool>);
        }

        result.map_err(|e| match e {
            CorpusError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::OperationInterrupted =>
            {
                let timeout_ms = self.query_timeout.map(|t| t.as_millis()).unwrap_or(0);
                Self::query_error(hop, seed_id, format!("deadline of {timeout_ms} ms exceeded"))
            }
            other => Self::query_error(hop, seed_id, other.to_string()),
        })
    }
}
