use rusqlite::Connection;
use std::sync::Mutex;

/// Owns the single SQLite connection behind a mutex, as this codebase always has — one
/// writer at a time, WAL mode for concurrent readers, a short busy timeout so contention
/// surfaces as a retryable error rather than a hang.
pub struct Db {
    pub conn: Mutex<Connection>,
}

impl Db {
    pub fn new(path: &str) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        let db = Db {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tenants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS tenant_users (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                PRIMARY KEY (user_id, tenant_id)
            );

            CREATE TABLE IF NOT EXISTS monitors (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                target TEXT NOT NULL,
                monitor_type TEXT NOT NULL DEFAULT 'http',
                keyword TEXT,
                check_interval_seconds INTEGER NOT NULL DEFAULT 60,
                timeout_seconds INTEGER NOT NULL DEFAULT 30,
                enabled INTEGER NOT NULL DEFAULT 1,
                check_ssl INTEGER NOT NULL DEFAULT 0,
                ssl_alert_days INTEGER NOT NULL DEFAULT 14,
                last_checked_at TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_monitors_tenant ON monitors(tenant_id);
            CREATE INDEX IF NOT EXISTS idx_monitors_due ON monitors(enabled, last_checked_at);

            CREATE TABLE IF NOT EXISTS monitor_checks (
                id TEXT PRIMARY KEY,
                monitor_id TEXT NOT NULL REFERENCES monitors(id) ON DELETE CASCADE,
                checked_at TEXT NOT NULL DEFAULT (datetime('now')),
                status_code INTEGER,
                response_time_ms INTEGER NOT NULL,
                success INTEGER NOT NULL,
                error_message TEXT,
                ssl_valid INTEGER,
                ssl_expires_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_checks_monitor ON monitor_checks(monitor_id, checked_at DESC);

            CREATE TABLE IF NOT EXISTS alert_rules (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                monitor_id TEXT REFERENCES monitors(id) ON DELETE CASCADE,
                trigger_type TEXT NOT NULL,
                threshold_value INTEGER NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_alert_rules_tenant ON alert_rules(tenant_id);

            CREATE TABLE IF NOT EXISTS alert_channels (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                channel_type TEXT NOT NULL,
                config TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_alert_channels_tenant ON alert_channels(tenant_id);

            CREATE TABLE IF NOT EXISTS alert_rule_channels (
                alert_rule_id TEXT NOT NULL REFERENCES alert_rules(id) ON DELETE CASCADE,
                alert_channel_id TEXT NOT NULL REFERENCES alert_channels(id) ON DELETE CASCADE,
                PRIMARY KEY (alert_rule_id, alert_channel_id)
            );

            CREATE TABLE IF NOT EXISTS incidents (
                id TEXT PRIMARY KEY,
                monitor_id TEXT NOT NULL REFERENCES monitors(id) ON DELETE CASCADE,
                alert_rule_id TEXT NOT NULL REFERENCES alert_rules(id) ON DELETE CASCADE,
                started_at TEXT NOT NULL DEFAULT (datetime('now')),
                resolved_at TEXT,
                status TEXT NOT NULL DEFAULT 'open',
                trigger_value TEXT NOT NULL,
                opened_notified_at TEXT,
                resolved_notified_at TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_incidents_open_unique
                ON incidents(monitor_id, alert_rule_id) WHERE status = 'open';
            CREATE INDEX IF NOT EXISTS idx_incidents_monitor ON incidents(monitor_id);
            CREATE INDEX IF NOT EXISTS idx_incidents_unnotified
                ON incidents(opened_notified_at, resolved_notified_at, status);
            ",
        )?;

        // Additive, idempotent column migrations follow the same pattern as the rest of
        // this table's schema history: `ALTER TABLE ... ADD COLUMN` guarded with `.ok()`
        // so re-running against an already-migrated database is a no-op.
        conn.execute("ALTER TABLE tenants ADD COLUMN slug TEXT", []).ok();
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_tenants_slug ON tenants(slug) WHERE slug IS NOT NULL",
            [],
        )
        .ok();

        Ok(())
    }
}
