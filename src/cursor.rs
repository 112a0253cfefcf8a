use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::connection::Shared;
use crate::error::{Error, Result};
use crate::formatter::format_query;
use crate::mapping::{describe, row_to_native};
use crate::traits::ResultSet;
use crate::types::{ColumnDescription, Params, Row};

/// A cursor over one statement at a time.
///
/// Created by [`crate::Connection::cursor`]. Executing a new statement
/// discards the previous one. Rows are pulled from the driver in pages of
/// `fetch_size` and buffered.
///
/// The cursor keeps the connection's runtime alive, so its statement is
/// released even when the [`crate::Connection`] is dropped first.
pub struct Cursor {
    connection: Arc<Shared>,
    result: Option<Box<dyn ResultSet>>,
    description: Option<Vec<ColumnDescription>>,
    buffer: VecDeque<Row>,
    exhausted: bool,
    /// Set once a page could not be fetched or converted; returned by every
    /// later fetch that needs more rows than are buffered.
    failure: Option<Error>,
    row_number: Option<usize>,
    array_size: usize,
    closed: bool,
}

impl Cursor {
    pub(crate) fn new(connection: Arc<Shared>) -> Self {
        Self {
            connection,
            result: None,
            description: None,
            buffer: VecDeque::new(),
            exhausted: false,
            failure: None,
            row_number: None,
            array_size: 1,
            closed: false,
        }
    }

    /// Format `query` with `params` and run it.
    ///
    /// The previous statement is released first. A `None` or empty query is
    /// rejected before formatting. On any failure the cursor is left without
    /// a result set.
    pub fn execute<'q>(
        &mut self,
        query: impl Into<Option<&'q str>>,
        params: impl Into<Params>,
    ) -> Result<&mut Self> {
        let shared = self.shared()?;
        self.release(&shared)?;

        let query = match query.into() {
            Some(q) if !q.is_empty() => q,
            _ => return Err(Error::Programming("query is none or empty".into())),
        };
        let sql = format_query(query, &params.into())?;

        debug!(sql = %sql, "Executing statement");
        let mut result = shared.run(shared.session.execute_statement(&sql))??;

        let columns = result.columns();
        if columns.is_empty() {
            shared.run(result.close())??;
            return Ok(self);
        }

        self.description = Some(columns.iter().map(describe).collect());
        self.result = Some(result);
        self.row_number = Some(0);
        Ok(self)
    }

    /// Always fails: batch execution is not supported.
    pub fn execute_many<I>(&mut self, _query: &str, _seq_of_params: I) -> Result<()>
    where
        I: IntoIterator<Item = Params>,
    {
        Err(Error::NotSupported("execute_many is not supported".into()))
    }

    /// Next row, or `None` once the result set is exhausted.
    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        let shared = self.active()?;
        self.fill(&shared, 1)?;
        let row = self.buffer.pop_front();
        if row.is_some() {
            self.advance(1);
        }
        Ok(row)
    }

    /// Up to `size` rows, `array_size` when `None`. Returns fewer at the end
    /// of the result set.
    pub fn fetch_many(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        let shared = self.active()?;
        let size = size.unwrap_or(self.array_size);
        self.fill(&shared, size)?;
        let take = size.min(self.buffer.len());
        let rows: Vec<Row> = self.buffer.drain(..take).collect();
        self.advance(rows.len());
        Ok(rows)
    }

    /// All remaining rows.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let shared = self.active()?;
        self.fill(&shared, usize::MAX)?;
        let rows: Vec<Row> = self.buffer.drain(..).collect();
        self.advance(rows.len());
        Ok(rows)
    }

    /// Iterate the remaining rows.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            cursor: self,
            done: false,
        }
    }

    /// No-op; cancellation is not supported.
    pub fn cancel(&mut self) -> Result<()> {
        self.shared().map(|_| ())
    }

    /// Release the statement and close the cursor. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let shared = Arc::clone(&self.connection);
        self.release(&shared)
    }

    /// Accepted and ignored.
    pub fn set_input_sizes(&mut self, _sizes: &[Option<usize>]) {}

    /// Accepted and ignored.
    pub fn set_output_size(&mut self, _size: usize, _column: Option<usize>) {}

    /// Column descriptions of the current result set.
    pub fn description(&self) -> Option<&[ColumnDescription]> {
        self.description.as_deref()
    }

    /// Always -1: row counts are not tracked.
    pub fn row_count(&self) -> i64 {
        -1
    }

    /// Zero-based position in the current result set.
    pub fn row_number(&self) -> Option<usize> {
        self.row_number
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn set_array_size(&mut self, array_size: usize) {
        self.array_size = array_size;
    }

    /// True after `close`, or once the parent connection is closed.
    pub fn is_closed(&self) -> bool {
        self.closed || self.connection.is_closed()
    }

    fn shared(&self) -> Result<Arc<Shared>> {
        if self.closed {
            return Err(Error::closed("cursor"));
        }
        if self.connection.is_closed() {
            return Err(Error::closed("connection"));
        }
        Ok(Arc::clone(&self.connection))
    }

    fn active(&self) -> Result<Arc<Shared>> {
        let shared = self.shared()?;
        if self.description.is_none() {
            return Err(Error::Programming("no result set".into()));
        }
        Ok(shared)
    }

    fn advance(&mut self, rows: usize) {
        if let Some(n) = self.row_number.as_mut() {
            *n += rows;
        }
    }

    /// Pull pages from the driver until `want` rows are buffered or the
    /// result set ends.
    ///
    /// A page is buffered only once every row in it converted. A failed
    /// page ends the result set; rows buffered before it can still be
    /// fetched, after which the failure is reported again on every fetch.
    fn fill(&mut self, shared: &Shared, want: usize) -> Result<()> {
        let (Some(result), Some(columns)) = (self.result.as_mut(), self.description.as_ref())
        else {
            return Ok(());
        };
        let fetch_size = shared.options.fetch_size;

        while self.buffer.len() < want && !self.exhausted {
            let page = shared
                .run(result.fetch_rows(fetch_size))
                .and_then(|fetched| fetched.map_err(Error::from))
                .and_then(|page| match page {
                    Some(page) if !page.is_empty() => page
                        .into_iter()
                        .map(|cells| row_to_native(columns, cells).map(Row::new))
                        .collect::<Result<Vec<_>>>()
                        .map(Some),
                    _ => Ok(None),
                });
            match page {
                Ok(Some(rows)) => {
                    debug!(rows = rows.len(), "Fetched page");
                    self.buffer.extend(rows);
                }
                Ok(None) => self.exhausted = true,
                Err(e) => {
                    warn!("Result set failed: {}", e);
                    self.exhausted = true;
                    self.failure = Some(e);
                }
            }
        }

        match self.failure {
            Some(ref e) if self.buffer.len() < want => Err(e.clone()),
            _ => Ok(()),
        }
    }

    /// Close the current statement handle and forget its results.
    fn release(&mut self, shared: &Shared) -> Result<()> {
        self.description = None;
        self.buffer.clear();
        self.exhausted = false;
        self.failure = None;
        self.row_number = None;
        if let Some(mut result) = self.result.take() {
            shared.run(result.close())??;
        }
        Ok(())
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if self.result.is_none() {
            return;
        }
        let shared = Arc::clone(&self.connection);
        if let Err(e) = self.release(&shared) {
            warn!("Failed to release statement: {}", e);
        }
    }
}

/// Iterator over the remaining rows of a cursor.
///
/// Yields `Err` at most once; iteration stops after an error.
pub struct Rows<'a> {
    cursor: &'a mut Cursor,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.fetch_one() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a> IntoIterator for &'a mut Cursor {
    type Item = Result<Row>;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}
