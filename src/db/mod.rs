//! Database layer for the task list.

pub mod tasks;

use anyhow::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Database handle pointing at a SQLite file.
///
/// No connection is held between operations: every call to
/// [`Database::with_conn`] opens its own connection and closes it when the
/// closure returns, on success and on error alike.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open or create the database at the given path and bring its schema
    /// up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Self {
            path: path.as_ref().to_path_buf(),
        };

        db.with_conn_mut(|conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
            Ok(())
        })?;
        db.run_migrations()?;

        Ok(db)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            let report = embedded::migrations::runner().run(conn)?;
            for migration in report.applied_migrations() {
                tracing::info!(
                    version = migration.version(),
                    name = migration.name(),
                    "Applied migration"
                );
            }
            Ok(())
        })
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Execute a function on a fresh connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    /// Execute a function with mutable access to a fresh connection (for
    /// transactions and migrations).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.connect()?;
        f(&mut conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_tasks_table() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("tasks.db")).unwrap();

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'tasks'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn reopening_keeps_existing_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.db");
        Database::open(&path).unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.path(), path.as_path());
    }
}
