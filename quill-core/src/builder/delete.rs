//! DELETE statement assembly with the Exact/All constraint gate.

use std::marker::PhantomData;

use tracing::debug;

use super::clause::{render_clauses, Clause};
use super::Gate;
use crate::error::{QuillError, QuillResult};
use crate::shape::Filter;

/// Builder for `DELETE FROM <container>` under the same gate rules as
/// updates.
pub struct Delete<F: Filter> {
    sql: String,
    gate: Gate,
    has_when: bool,
    _filter: PhantomData<F>,
}

/// Start a delete over `container`.
pub fn delete<F: Filter>(container: &str, gate: Gate) -> Delete<F> {
    Delete {
        sql: format!("DELETE FROM {container}"),
        gate,
        has_when: false,
        _filter: PhantomData,
    }
}

impl<F: Filter> Delete<F> {
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

    /// Emit the final SQL text, enforcing the constraint gate.
    pub fn statement(self) -> QuillResult<String> {
        match self.gate {
            Gate::Exact if !self.has_when => {
                return Err(QuillError::MismatchedConstraint(
                    "Exact delete built without a when".to_owned(),
                ))
            }
            Gate::All if self.has_when => {
                return Err(QuillError::MismatchedConstraint(
                    "All delete built with a when".to_owned(),
                ))
            }
            _ => {}
        }
        if self.sql.ends_with(';') {
            return Err(QuillError::chain("statement", "text is already terminated"));
        }
        let sql = format!("{};", self.sql);
        debug!(%sql, "built delete statement");
        Ok(sql)
    }
}
