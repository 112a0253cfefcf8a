use std::error::Error as StdError;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, NoTls, Row, RowStream};
use tracing::{debug, warn};

use crate::config::{ConnectOptions, DEFAULT_SCHEMA_NAME};
use crate::error::{DriverError, DriverResult};
use crate::traits::{Driver, DriverSession, ResultSet};
use crate::types::{ColumnMetadata, DriverValue, Nullability, TypeCode};

/// Driver for engines that speak the PostgreSQL wire protocol, using
/// tokio-postgres. Useful against local stand-ins for the remote service.
pub struct PostgresDriver {
    connection_string: String,
}

impl PostgresDriver {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    async fn connect(&self, options: &ConnectOptions) -> DriverResult<Arc<dyn DriverSession>> {
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls)
            .await
            .map_err(|e| DriverError::Session(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("PostgreSQL connection error: {}", e);
            }
        });

        if options.schema_name != DEFAULT_SCHEMA_NAME {
            client
                .batch_execute(&format!(
                    "SET search_path TO {}",
                    quote_ident(&options.schema_name)
                ))
                .await
                .map_err(|e| DriverError::Session(e.to_string()))?;
        }

        debug!("PostgreSQL session opened");
        Ok(Arc::new(PostgresSession {
            client: Mutex::new(Some(Arc::new(client))),
        }))
    }
}

struct PostgresSession {
    client: Mutex<Option<Arc<Client>>>,
}

impl PostgresSession {
    fn client(&self) -> DriverResult<Arc<Client>> {
        self.client
            .lock()
            .map_err(|_| DriverError::Other("session lock poisoned".into()))?
            .clone()
            .ok_or_else(|| DriverError::Session("session is closed".into()))
    }
}

#[async_trait]
impl DriverSession for PostgresSession {
    async fn execute_statement(&self, sql: &str) -> DriverResult<Box<dyn ResultSet>> {
        let client = self.client()?;
        let statement = client.prepare(sql).await.map_err(translate)?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| column_metadata(c.name(), c.type_()))
            .collect();
        let rows = client
            .query_raw(&statement, std::iter::empty::<&dyn ToSql>())
            .await
            .map_err(translate)?;

        Ok(Box::new(PostgresResultSet {
            columns,
            rows: Some(Box::pin(rows)),
            _client: client,
        }))
    }

    async fn close(&self) -> DriverResult<()> {
        // Dropping the client ends the spawned connection task.
        self.client
            .lock()
            .map_err(|_| DriverError::Other("session lock poisoned".into()))?
            .take();
        Ok(())
    }
}

/// Rows are read off the wire as they are fetched, `max_rows` at a time.
struct PostgresResultSet {
    columns: Vec<ColumnMetadata>,
    rows: Option<Pin<Box<RowStream>>>,
    _client: Arc<Client>,
}

#[async_trait]
impl ResultSet for PostgresResultSet {
    fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    async fn fetch_rows(&mut self, max_rows: usize) -> DriverResult<Option<Vec<Vec<DriverValue>>>> {
        let Some(stream) = self.rows.as_mut() else {
            return Ok(None);
        };
        let mut page = Vec::new();
        let mut finished = false;
        while page.len() < max_rows {
            match stream.next().await {
                Some(row) => page.push(row_values(&row.map_err(translate)?)?),
                None => {
                    finished = true;
                    break;
                }
            }
        }
        if finished {
            self.rows = None;
        }
        if page.is_empty() {
            return Ok(None);
        }
        Ok(Some(page))
    }

    async fn close(&mut self) -> DriverResult<()> {
        // Dropping the stream discards whatever the server still sends.
        self.rows = None;
        Ok(())
    }
}

fn translate(err: tokio_postgres::Error) -> DriverError {
    if let Some(db) = err.as_db_error() {
        return DriverError::Execution {
            message: db.message().to_string(),
            sql_state: Some(db.code().code().to_string()),
        };
    }
    if err.is_closed() {
        return DriverError::Session(err.to_string());
    }
    DriverError::Other(err.to_string())
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Column metadata in JDBC terms for a PostgreSQL column type.
fn column_metadata(name: &str, ty: &Type) -> ColumnMetadata {
    let (type_code, display_size, precision) = match *ty {
        Type::BOOL => (TypeCode::BOOLEAN, 5, 0),
        Type::INT2 => (TypeCode::SMALLINT, 6, 5),
        Type::INT4 => (TypeCode::INTEGER, 11, 10),
        Type::INT8 => (TypeCode::BIGINT, 20, 19),
        Type::FLOAT4 => (TypeCode::REAL, 15, 8),
        Type::FLOAT8 => (TypeCode::DOUBLE, 25, 17),
        Type::NUMERIC => (TypeCode::NUMERIC, 0, 0),
        Type::TEXT | Type::VARCHAR | Type::NAME => {
            (TypeCode::VARCHAR, 1_073_741_824, 1_073_741_824)
        }
        Type::BPCHAR => (TypeCode::CHAR, 1_073_741_824, 1_073_741_824),
        Type::BYTEA => (TypeCode::BINARY, 1_073_741_824, 1_073_741_824),
        Type::DATE => (TypeCode::DATE, 10, 0),
        Type::TIME => (TypeCode::TIME, 15, 6),
        Type::TIMESTAMP | Type::TIMESTAMPTZ => (TypeCode::TIMESTAMP, 29, 6),
        Type::BOOL_ARRAY
        | Type::INT2_ARRAY
        | Type::INT4_ARRAY
        | Type::INT8_ARRAY
        | Type::FLOAT4_ARRAY
        | Type::FLOAT8_ARRAY
        | Type::TEXT_ARRAY
        | Type::VARCHAR_ARRAY => (TypeCode::ARRAY, 0, 0),
        _ => (TypeCode::OTHER, 0, 0),
    };
    ColumnMetadata::new(name, type_code)
        .display_size(display_size)
        .precision(precision)
        .nullable(Nullability::Unknown)
}

fn row_values(row: &Row) -> DriverResult<Vec<DriverValue>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| cell_value(row, idx, column.type_()))
        .collect()
}

fn array<T: Into<DriverValue>>(values: Option<Vec<Option<T>>>) -> DriverValue {
    match values {
        Some(items) => DriverValue::Array(items.into_iter().map(Into::into).collect()),
        None => DriverValue::Null,
    }
}

fn cell_value(row: &Row, idx: usize, ty: &Type) -> DriverResult<DriverValue> {
    let value: Result<DriverValue, tokio_postgres::Error> = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map(Into::into),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map(|v| v.map(i64::from).into()),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx).map(Into::into),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map(Into::into),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(f64::from).into()),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map(Into::into),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .map(|v| v.map_or(DriverValue::Null, DriverValue::Bytes)),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .map(|v| v.map_or(DriverValue::Null, DriverValue::Date)),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .map(|v| v.map_or(DriverValue::Null, DriverValue::Timestamp)),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map(|v| v.map_or(DriverValue::Null, |ts| DriverValue::Timestamp(ts.naive_utc()))),
        Type::TIME => row
            .try_get::<_, Option<chrono::NaiveTime>>(idx)
            .map(|v| {
                v.map_or(DriverValue::Null, |t| {
                    DriverValue::Text(t.format("%H:%M:%S%.f").to_string())
                })
            }),
        Type::BOOL_ARRAY => row.try_get::<_, Option<Vec<Option<bool>>>>(idx).map(array),
        Type::INT2_ARRAY => row
            .try_get::<_, Option<Vec<Option<i16>>>>(idx)
            .map(|v| array(v.map(|items| items.into_iter().map(|i| i.map(i64::from)).collect()))),
        Type::INT4_ARRAY => row.try_get::<_, Option<Vec<Option<i32>>>>(idx).map(array),
        Type::INT8_ARRAY => row.try_get::<_, Option<Vec<Option<i64>>>>(idx).map(array),
        Type::FLOAT4_ARRAY => row
            .try_get::<_, Option<Vec<Option<f32>>>>(idx)
            .map(|v| array(v.map(|items| items.into_iter().map(|f| f.map(f64::from)).collect()))),
        Type::FLOAT8_ARRAY => row.try_get::<_, Option<Vec<Option<f64>>>>(idx).map(array),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => row
            .try_get::<_, Option<Vec<Option<String>>>>(idx)
            .map(|v| array(v.map(|items| items.into_iter().map(|s| s.map(DriverValue::Text)).collect()))),
        Type::NUMERIC => {
            return Err(DriverError::Unsupported(format!(
                "cannot decode column {} of type NUMERIC",
                row.columns()[idx].name()
            )))
        }
        _ => row
            .try_get::<_, Option<AnyText>>(idx)
            .map(|v| v.map_or(DriverValue::Null, |text| DriverValue::Text(text.0))),
    };
    value.map_err(|e| DriverError::Protocol(format!("unsupported column type {}: {}", ty, e)))
}

/// Text rendering for any column type without a dedicated decoder.
///
/// Textual wire formats (text, json, enums, xml) pass through; `jsonb`
/// drops its version byte and `uuid` is printed hyphenated. Anything else
/// that is not UTF-8 is rendered as `\x`-prefixed hex.
struct AnyText(String);

impl<'a> FromSql<'a> for AnyText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        if *ty == Type::UUID && raw.len() == 16 {
            let h = hex(raw);
            return Ok(AnyText(format!(
                "{}-{}-{}-{}-{}",
                &h[0..8],
                &h[8..12],
                &h[12..16],
                &h[16..20],
                &h[20..32]
            )));
        }
        let raw = match (ty, raw.split_first()) {
            (&Type::JSONB, Some((&1, rest))) => rest,
            _ => raw,
        };
        match std::str::from_utf8(raw) {
            Ok(text) => Ok(AnyText(text.to_string())),
            Err(_) => Ok(AnyText(format!("\\x{}", hex(raw)))),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
