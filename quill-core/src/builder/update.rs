//! UPDATE statement assembly with the Exact/All constraint gate.

use std::marker::PhantomData;

use tracing::debug;

use super::clause::{render_clauses, Clause};
use super::Gate;
use crate::error::{QuillError, QuillResult};
use crate::shape::{Filter, Model};

/// Builder for `UPDATE <container> SET field = :field, …`.
///
/// The gate guards against accidental full-table writes: `Exact`
/// requires a `when`, `All` forbids one; [`Update::statement`] rejects
/// a mismatch.
pub struct Update<M: Model, F: Filter> {
    sql: String,
    gate: Gate,
    has_when: bool,
    _model: PhantomData<M>,
    _filter: PhantomData<F>,
}

/// Start an update of the model shape over `container`.
pub fn update<M: Model, F: Filter>(container: &str, gate: Gate) -> Update<M, F> {
    let assignments: Vec<String> = M::FIELDS
        .iter()
        .map(|f| format!("{} = :{}", f.label, f.label))
        .collect();
    Update {
        sql: format!("UPDATE {} SET {}", container, assignments.join(", ")),
        gate,
        has_when: false,
        _model: PhantomData,
        _filter: PhantomData,
    }
}

impl<M: Model, F: Filter> Update<M, F> {
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
                    "Exact update built without a when".to_owned(),
                ))
            }
            Gate::All if self.has_when => {
                return Err(QuillError::MismatchedConstraint(
                    "All update built with a when".to_owned(),
                ))
            }
            _ => {}
        }
        if self.sql.ends_with(';') {
            return Err(QuillError::chain("statement", "text is already terminated"));
        }
        let sql = format!("{};", self.sql);
        debug!(%sql, "built update statement");
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::clause::{filter, Operator};
    use crate::error::QuillResult;
    use crate::shape::{FieldDef, Filter, Model};
    use crate::types::{Bindable, Descriptor};

    struct UserModel;

    impl Model for UserModel {
        const FIELDS: &'static [FieldDef] = &[
            FieldDef::new("uuid", Descriptor::Blob, false),
            FieldDef::new("name", Descriptor::TextBytes, false),
            FieldDef::new("age", Descriptor::Int, false),
        ];

        fn bind_value(&self, _index: usize) -> QuillResult<Bindable<'_>> {
            Ok(Bindable::Null)
        }
    }

    struct UserFilter;

    impl Filter for UserFilter {
        const FIELDS: &'static [FieldDef] = &[FieldDef::new("age", Descriptor::Int, false)];
    }

    #[test]
    fn test_exact_update() {
        let sql = update::<UserModel, UserFilter>("users", Gate::Exact)
            .when([filter("age", Operator::Eq, 0)])
            .unwrap()
            .statement()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE users SET uuid = :uuid, name = :name, age = :age\nWHERE age = :_age;"
        );
    }

    #[test]
    fn test_all_update() {
        let sql = update::<UserModel, UserFilter>("users", Gate::All)
            .statement()
            .unwrap();
        assert_eq!(sql, "UPDATE users SET uuid = :uuid, name = :name, age = :age;");
    }

    #[test]
    fn test_exact_without_when_fails() {
        let err = update::<UserModel, UserFilter>("users", Gate::Exact)
            .statement()
            .unwrap_err();
        assert!(matches!(err, QuillError::MismatchedConstraint(_)));
    }

    #[test]
    fn test_all_with_when_fails() {
        let err = update::<UserModel, UserFilter>("users", Gate::All)
            .when([filter("age", Operator::Eq, 0)])
            .unwrap()
            .statement()
            .unwrap_err();
        assert!(matches!(err, QuillError::MismatchedConstraint(_)));
    }
}
