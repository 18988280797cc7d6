//! The CRUD facade: one prepared statement, orchestrating bind → step →
//! read, plus transaction control through the one-shot exec path.

use tracing::debug;

use crate::bind::{bind_filter, bind_filter_at, bind_record};
use crate::driver::{Connection, Statement, Step};
use crate::error::QuillResult;
use crate::extract::Row;
use crate::shape::{Model, View};
use crate::types::Argument;

/// Owner of one prepared statement. The statement is reset between
/// bindings and finalized when the facade drops.
pub struct Crud<'conn> {
    conn: &'conn Connection,
    stmt: Statement<'conn>,
}

impl<'conn> Crud<'conn> {
    /// Prepare `sql` on the connection.
    pub fn prepare(conn: &'conn Connection, sql: &str) -> QuillResult<Self> {
        debug!(%sql, "preparing statement");
        Ok(Self {
            conn,
            stmt: conn.prepare(sql)?,
        })
    }

    /// Reset the statement and bind a model record; does not step.
    pub fn bind<M: Model>(&mut self, record: &M) -> QuillResult<()> {
        self.stmt.reset()?;
        self.stmt.clear_bindings()?;
        bind_record(&mut self.stmt, record)
    }

    /// Bind a scalar filter argument (`:_field`).
    pub fn bind_filter(&mut self, label: &str, arg: Argument<'_>) -> QuillResult<()> {
        bind_filter(&mut self.stmt, label, arg)
    }

    /// Bind the `n`-th filter argument of a `between`/`in` placeholder
    /// group (`:_field1`, `:_field2`, …).
    pub fn bind_filter_at(&mut self, label: &str, n: usize, arg: Argument<'_>) -> QuillResult<()> {
        bind_filter_at(&mut self.stmt, label, n, arg)
    }

    /// Reset the statement without touching its bindings.
    pub fn reset(&mut self) -> QuillResult<()> {
        self.stmt.reset()
    }

    /// Step the held statement once.
    pub fn step(&mut self) -> QuillResult<Step> {
        self.stmt.step()
    }

    /// Bind a record and step once.
    pub fn exec<M: Model>(&mut self, record: &M) -> QuillResult<Step> {
        self.bind(record)?;
        self.stmt.step()
    }

    /// Step once; extract a view value if a row is produced.
    pub fn read_one<V: View>(&mut self) -> QuillResult<Option<V>> {
        match self.stmt.step()? {
            Step::Done => Ok(None),
            Step::Row => {
                let row = Row::new(&self.stmt)?;
                Ok(Some(V::from_row(&row)?))
            }
        }
    }

    /// Step until done, collecting every row as a view value.
    pub fn read_many<V: View>(&mut self) -> QuillResult<Vec<V>> {
        let mut values = Vec::new();
        while self.stmt.step()? == Step::Row {
            let row = Row::new(&self.stmt)?;
            values.push(V::from_row(&row)?);
        }
        Ok(values)
    }

    /// Begin a transaction on the owning connection.
    pub fn begin(&self) -> QuillResult<()> {
        self.conn.exec("BEGIN;").map(|_| ())
    }

    /// Commit the current transaction.
    pub fn commit(&self) -> QuillResult<()> {
        self.conn.exec("COMMIT;").map(|_| ())
    }

    /// Roll back the current transaction.
    pub fn rollback(&self) -> QuillResult<()> {
        self.conn.exec("ROLLBACK;").map(|_| ())
    }
}
