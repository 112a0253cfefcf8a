//! athenars - A DB-API style client for interactive query services
//!
//! Queries run through a pluggable [`Driver`]; the crate supplies the
//! connection and cursor state machine, parameter formatting, type mapping
//! and the DB-API error taxonomy.
//!
//! # Example
//! ```ignore
//! use athenars::{connect, params, ConnectOptions};
//!
//! let conn = connect(&driver, ConnectOptions::from_env().schema_name("sales"))?;
//! let mut cursor = conn.cursor()?;
//!
//! cursor.execute("SELECT {0:d}, {1:s} FROM one_row", params![1, "x"])?;
//! for row in &mut cursor {
//!     let row = row?;
//!     println!("{:?}", row.values());
//! }
//! conn.close()?;
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod formatter;
pub mod logging;
pub mod mapping;
pub mod traits;
pub mod types;

mod connection;
mod cursor;

// Re-export main types for convenient access
pub use config::ConnectOptions;
pub use connection::{connect, Connection};
pub use cursor::{Cursor, Rows};
pub use error::{DriverError, DriverResult, Error, ErrorKind, Result};
pub use traits::{Driver, DriverSession, ResultSet};
pub use types::{
    ColumnDescription, ColumnMetadata, DriverValue, Nullability, Params, Row, SqlValue, TypeCode,
    Value,
};
