//! SELECT statement assembly.

use std::marker::PhantomData;

use tracing::debug;

use super::clause::{render_clauses, render_orderings, Clause, Ordering};
use crate::error::{QuillError, QuillResult};
use crate::shape::{Filter, View};

/// Builder for `SELECT <view fields> FROM <container>`.
///
/// Optional steps run as a state machine with a monotonically
/// increasing ordinal: `dist` (only first), `when`, `sort`, `limit`,
/// `skip`, then the terminal [`Find::statement`]. Calling a step out of
/// order fails with `InvalidFunctionChain`.
#[derive(Debug)]
pub struct Find<V: View, F: Filter> {
    body: String,
    distinct: bool,
    seq: u8,
    _view: PhantomData<V>,
    _filter: PhantomData<F>,
}

/// Start a find over `container`, selecting the view shape's labels.
pub fn find<V: View, F: Filter>(container: &str) -> Find<V, F> {
    let labels: Vec<&str> = V::FIELDS.iter().map(|f| f.label).collect();
    Find {
        body: format!("{} FROM {}", labels.join(", "), container),
        distinct: false,
        seq: 1,
        _view: PhantomData,
        _filter: PhantomData,
    }
}

impl<V: View, F: Filter> Find<V, F> {
    fn advance(&mut self, step: &'static str, slot: u8) -> QuillResult<()> {
        if self.seq >= slot {
            return Err(QuillError::chain(
                step,
                format!("must precede step {} of the chain", self.seq),
            ));
        }
        self.seq = slot;
        Ok(())
    }

    /// Replace `SELECT` with `SELECT DISTINCT`. Only valid before any
    /// other step.
    pub fn dist(mut self) -> QuillResult<Self> {
        if self.seq != 1 || self.distinct {
            return Err(QuillError::chain("dist", "must be the first step"));
        }
        self.distinct = true;
        Ok(self)
    }

    /// Append `WHERE` with the rendered token sequence.
    pub fn when(mut self, clauses: impl Into<Vec<Clause>>) -> QuillResult<Self> {
        self.advance("when", 2)?;
        let rendered = render_clauses(&clauses.into(), F::FIELDS)?;
        self.body.push_str("\nWHERE ");
        self.body.push_str(&rendered);
        Ok(self)
    }

    /// Append `ORDER BY`, preserving the caller's ordering order.
    pub fn sort(mut self, orderings: impl Into<Vec<Ordering>>) -> QuillResult<Self> {
        self.advance("sort", 3)?;
        let rendered = render_orderings(&orderings.into(), F::FIELDS)?;
        self.body.push_str("\nORDER BY ");
        self.body.push_str(&rendered);
        Ok(self)
    }

    /// Append `LIMIT n`.
    pub fn limit(mut self, n: u64) -> QuillResult<Self> {
        self.advance("limit", 4)?;
        self.body.push_str(&format!("\nLIMIT {n}"));
        Ok(self)
    }

    /// Append `OFFSET n`.
    pub fn skip(mut self, n: u64) -> QuillResult<Self> {
        self.advance("skip", 5)?;
        self.body.push_str(&format!("\nOFFSET {n}"));
        Ok(self)
    }

    /// Emit the final SQL text, terminated with `;`.
    pub fn statement(self) -> QuillResult<String> {
        if self.body.ends_with(';') {
            return Err(QuillError::chain("statement", "text is already terminated"));
        }
        let prefix = if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        };
        let sql = format!("{}{};", prefix, self.body);
        debug!(%sql, "built find statement");
        Ok(sql)
    }
}
