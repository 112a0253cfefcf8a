use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::config::ConnectOptions;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::logging::init_logging;
use crate::traits::{Driver, DriverSession};

/// State shared between a connection and the cursors it hands out.
pub(crate) struct Shared {
    pub(crate) session: Arc<dyn DriverSession>,
    pub(crate) options: ConnectOptions,
    runtime: tokio::runtime::Runtime,
    session_lock: Mutex<()>,
    closed: AtomicBool,
}

impl Shared {
    /// Drive a driver future to completion while holding the session lock.
    pub(crate) fn run<F: Future>(&self, future: F) -> Result<F::Output> {
        let _guard = self
            .session_lock
            .lock()
            .map_err(|_| Error::Interface("session lock poisoned".into()))?;
        Ok(self.runtime.block_on(future))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Open a connection through `driver`.
///
/// # Example
/// ```ignore
/// let conn = athenars::connect(&driver, ConnectOptions::from_env().schema_name("sales"))?;
/// let mut cursor = conn.cursor()?;
/// let rows = cursor.execute("SELECT * FROM one_row", ())?.fetch_all()?;
/// ```
pub fn connect(driver: &dyn Driver, options: ConnectOptions) -> Result<Connection> {
    Connection::open(driver, options)
}

/// A connection owning one driver session.
///
/// Every session call made by the connection or its cursors is serialized
/// through a per-connection lock, so cursors may live on different threads
/// but never overlap on the session.
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    /// Validate `options`, start the blocking runtime and open a session.
    pub fn open(driver: &dyn Driver, options: ConnectOptions) -> Result<Self> {
        options.validate()?;
        init_logging(&options.log);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("athenars-driver")
            .enable_all()
            .build()
            .map_err(|e| Error::Connection(format!("failed to start runtime: {}", e)))?;

        let session = runtime.block_on(driver.connect(&options))?;
        debug!(
            schema = %options.schema_name,
            catalog = %options.catalog_name,
            "Opened session"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                session,
                options,
                runtime,
                session_lock: Mutex::new(()),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Create a new cursor sharing this connection's session.
    pub fn cursor(&self) -> Result<Cursor> {
        self.ensure_open()?;
        Ok(Cursor::new(Arc::clone(&self.shared)))
    }

    /// Close the session. Cursors created from this connection become
    /// unusable but still release their own statements on `close` or drop.
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!(schema = %self.shared.options.schema_name, "Closing session");
        self.shared.run(self.shared.session.close())??;
        Ok(())
    }

    /// No-op: the service has no transactional writes.
    pub fn commit(&self) -> Result<()> {
        self.ensure_open()
    }

    /// Always fails: the service cannot roll back.
    pub fn rollback(&self) -> Result<()> {
        Err(Error::NotSupported("rollback is not supported".into()))
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn schema_name(&self) -> &str {
        &self.shared.options.schema_name
    }

    pub fn catalog_name(&self) -> &str {
        &self.shared.options.catalog_name
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.shared.options
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::closed("connection"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("schema_name", &self.schema_name())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Clean up session on connection drop
        if let Err(e) = self.close() {
            warn!("Failed to close session: {}", e);
        }
    }
}
