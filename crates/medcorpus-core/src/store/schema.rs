//! SQLite DDL for the medical property graph.

/// Tables and indexes backing the graph. Every statement is
/// `IF NOT EXISTS`, so replaying the list on an initialised database is a
/// no-op.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // ── tables ──────────────────────────────────────────────────────────
    "CREATE TABLE IF NOT EXISTS nodes (
        label TEXT NOT NULL,
        node_id TEXT NOT NULL,
        name TEXT,
        description TEXT,
        PRIMARY KEY(label, node_id)
    );",
    "CREATE TABLE IF NOT EXISTS edges (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_label TEXT NOT NULL,
        source_id TEXT NOT NULL,
        relationship TEXT NOT NULL,
        target_label TEXT NOT NULL,
        target_id TEXT NOT NULL,
        UNIQUE(source_label, source_id, relationship, target_label, target_id)
    );",
    // ── indexes ─────────────────────────────────────────────────────────
    "CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label);",
    "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_label, source_id, relationship);",
    "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_label, target_id, relationship);",
    "CREATE INDEX IF NOT EXISTS idx_edges_relationship ON edges(relationship);",
    // Every hop pattern walks `Drug -TREATS-> Disease` backwards from the seed.
    "CREATE INDEX IF NOT EXISTS idx_edges_treats_target \
     ON edges(relationship, target_id) WHERE relationship = 'TREATS';",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn apply(conn: &Connection) {
        for stmt in SCHEMA_STATEMENTS {
            conn.execute_batch(stmt).unwrap();
        }
    }

    fn index_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%' ORDER BY name;")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn creates_tables_and_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn);
        assert_eq!(
            index_names(&conn),
            vec![
                "idx_edges_relationship",
                "idx_edges_source",
                "idx_edges_target",
                "idx_edges_treats_target",
                "idx_nodes_label",
            ]
        );
    }

    #[test]
    fn replay_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn);
        conn.execute(
            "INSERT INTO nodes(label, node_id, name) VALUES ('Disease', 'A00', 'Tả');",
            [],
        )
        .unwrap();
        apply(&conn);
        let nodes: i64 = conn
            .query_row("SELECT COUNT(*) FROM nodes;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(nodes, 1);
    }
}
