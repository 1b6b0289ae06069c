//! Single shared SQLite connection with a configure -> connect -> execute -> disconnect lifecycle.
//!
//! Every operation takes the store mutex for its full duration, so statements from
//! concurrent callers run one at a time on the one connection.

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::errors::Error;

static GLOBAL: LazyLock<Store> = LazyLock::new(Store::new);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StoreState {
    /// No path yet.
    Unconfigured,
    /// Path set, never connected.
    Configured,
    Connected,
    Disconnected,
    /// A close failed; the handle was dropped and only `connect()` leaves this state.
    Faulted,
}

struct Inner {
    path: Option<PathBuf>,
    conn: Option<Connection>,
    state: StoreState,
}

pub struct Store {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Store")
            .field("path", &inner.path)
            .field("state", &inner.state)
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// An independent, unconfigured store for callers that pass it around explicitly.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { path: None, conn: None, state: StoreState::Unconfigured }),
        }
    }

    /// The process-wide instance, built once on first access.
    pub fn global() -> &'static Store {
        &GLOBAL
    }

    pub fn state(&self) -> StoreState {
        self.inner.lock().state
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.inner.lock().path.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == StoreState::Connected
    }

    /// Set the database file. Only allowed before the first connection.
    pub fn set_path(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        match inner.state {
            StoreState::Unconfigured | StoreState::Configured => {
                inner.path = Some(path.as_ref().to_path_buf());
                inner.state = StoreState::Configured;
                Ok(())
            }
            state => Err(Error::Configuration(format!(
                "store path is fixed once a connection was opened (state: {state:?})"
            ))),
        }
    }

    /// Open the configured database.
    ///
    /// # Errors
    /// `Error::Configuration` without a path, `Error::Connection` when already connected or
    /// when SQLite cannot open the file. The state is never `Connected` after an error.
    pub fn connect(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        let path = match (&inner.path, inner.state) {
            (None, _) => return Err(Error::Configuration("store path is not set".into())),
            (Some(_), StoreState::Connected) => {
                return Err(Error::Connection("store is already connected".into()));
            }
            (Some(p), _) => p.clone(),
        };
        let conn = Connection::open(&path)
            .map_err(|e| Error::Connection(format!("can't open {}: {e}", path.display())))?;
        // SQLite opens lazily; reading the header surfaces unreadable or non-database files.
        conn.pragma_query_value(None, "schema_version", |row| row.get::<_, i64>(0))
            .map_err(|e| Error::Connection(format!("can't open {}: {e}", path.display())))?;
        inner.conn = Some(conn);
        inner.state = StoreState::Connected;
        log::info!("store connected path={}", path.display());
        Ok(())
    }

    /// Close the connection.
    ///
    /// # Errors
    /// `Error::Connection` when not connected, or when SQLite refuses to close; the handle is
    /// then discarded and the store is `Faulted` until the next `connect()`.
    pub fn disconnect(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        let conn = match (inner.state, inner.conn.take()) {
            (StoreState::Connected, Some(conn)) => conn,
            (state, _) => {
                return Err(Error::Connection(format!("store is not connected (state: {state:?})")));
            }
        };
        match conn.close() {
            Ok(()) => {
                inner.state = StoreState::Disconnected;
                log::info!("store disconnected");
                Ok(())
            }
            Err((conn, e)) => {
                drop(conn);
                inner.state = StoreState::Faulted;
                log::warn!("store close failed: {e}");
                Err(Error::Connection(format!("can't close db: {e}")))
            }
        }
    }

    /// Run one or more `;`-separated statements. Rows, if any, are discarded.
    ///
    /// # Errors
    /// `Error::Configuration` before any path is set, `Error::Connection` when not connected,
    /// `Error::Execution` with SQLite's message when a statement fails.
    pub fn execute(&self, sql: &str) -> Result<(), Error> {
        let inner = self.inner.lock();
        let conn = match (&inner.conn, &inner.path) {
            (Some(conn), _) => conn,
            (None, None) => return Err(Error::Configuration("store path is not set".into())),
            (None, Some(_)) => {
                return Err(Error::Connection(format!(
                    "store is not connected (state: {:?})",
                    inner.state
                )));
            }
        };
        conn.execute_batch(sql).map_err(|e| {
            log::debug!("statement rejected: {e}");
            Error::Execution(format!("can't execute sql: {e}"))
        })
    }

    #[cfg(test)]
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, Error> {
        let inner = self.inner.lock();
        let conn = inner
            .conn
            .as_ref()
            .ok_or_else(|| Error::Connection("store is not connected".into()))?;
        f(conn).map_err(|e| Error::Execution(e.to_string()))
    }
}
