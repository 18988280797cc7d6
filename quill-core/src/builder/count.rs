//! SELECT COUNT(*) statement assembly.

use std::marker::PhantomData;

use tracing::debug;

use super::clause::{render_clauses, Clause};
use crate::error::{QuillError, QuillResult};
use crate::shape::Filter;

/// Builder for `SELECT COUNT(*) FROM <container>` with an optional
/// `when` step.
#[derive(Debug)]
pub struct Count<F: Filter> {
    sql: String,
    has_when: bool,
    _filter: PhantomData<F>,
}

/// Start a count over `container`.
pub fn count<F: Filter>(container: &str) -> Count<F> {
    Count {
        sql: format!("SELECT COUNT(*) FROM {container}"),
        has_when: false,
        _filter: PhantomData,
    }
}

impl<F: Filter> Count<F> {
    /// Append `WHERE` with the rendered token sequence.
    pub fn when(mut self, clauses: impl Into<Vec<Clause>>) -> QuillResult<Self> {
        if self.has_when {
            return Err(QuillError::chain("when", "WHERE was already appended"));
        }
        let rendered = render_clauses(&clauses.into(), F::FIELDS)?;
        self.sql.push_str("\nWHERE ");
        self.sql.push_str(&rendered);
        self.has_when = true;
        Ok(self)
    }

    /// Emit the final SQL text, terminated with `;`.
    pub fn statement(self) -> QuillResult<String> {
        if self.sql.ends_with(';') {
            return Err(QuillError::chain("statement", "text is already terminated"));
        }
        let sql = format!("{};", self.sql);
        debug!(%sql, "built count statement");
        Ok(sql)
    }
}
