//! Clause primitives: comparison tokens, logical connectives, and
//! parenthesised groups, rendered against a filter shape.
//!
//! Filter placeholders are named `:_field` (`:_field1`, `:_field2`, …
//! for the multi-placeholder operators) so that bind values (`:field`)
//! and filter values can coexist in one statement.

use crate::error::{QuillError, QuillResult};
use crate::shape::{field, FieldDef};
use crate::types::Storage;

/// Comparison and membership operators for filter tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    /// `LIKE`; the caller supplies a %-anchored pattern in the bound value.
    Contains,
    /// `NOT LIKE`.
    NotContains,
    Between,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

/// Logical connective between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
    Not,
}

impl Connective {
    fn keyword(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Not => "NOT",
        }
    }
}

/// One token of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Filter {
        field: &'static str,
        op: Operator,
        len: usize,
    },
    Chain(Connective),
    Group(Vec<Clause>),
}

/// Comparison token over a filter-shape field. `len` counts the
/// placeholders of `In`/`NotIn` and is ignored elsewhere.
pub fn filter(field: &'static str, op: Operator, len: usize) -> Clause {
    Clause::Filter { field, op, len }
}

/// Logical connective token.
pub fn chain(connective: Connective) -> Clause {
    Clause::Chain(connective)
}

/// Parenthesised group of tokens.
pub fn group(items: impl Into<Vec<Clause>>) -> Clause {
    Clause::Group(items.into())
}

/// Render a token sequence joined by single spaces, validating every
/// referenced field against the filter shape.
pub(crate) fn render_clauses(
    clauses: &[Clause],
    fields: &'static [FieldDef],
) -> QuillResult<String> {
    let parts: Vec<String> = clauses
        .iter()
        .map(|c| render_clause(c, fields))
        .collect::<QuillResult<_>>()?;
    Ok(parts.join(" "))
}

fn render_clause(clause: &Clause, fields: &'static [FieldDef]) -> QuillResult<String> {
    match clause {
        Clause::Chain(connective) => Ok(connective.keyword().to_owned()),
        Clause::Group(items) => Ok(format!("({})", render_clauses(items, fields)?)),
        Clause::Filter { field: label, op, len } => {
            let def = field(fields, label).ok_or_else(|| QuillError::InvalidNamingConvention {
                field: (*label).to_owned(),
                shape: "filter",
            })?;
            render_filter(def, *op, *len)
        }
    }
}

fn render_filter(def: &FieldDef, op: Operator, len: usize) -> QuillResult<String> {
    let label = def.label;
    if matches!(op, Operator::Contains | Operator::NotContains)
        && def.descriptor.storage() != Storage::Text
    {
        return Err(QuillError::MismatchedConstraint(format!(
            "pattern operator needs a text field, '{label}' is not"
        )));
    }
    Ok(match op {
        Operator::Eq => format!("{label} = :_{label}"),
        Operator::Ne => format!("{label} != :_{label}"),
        Operator::Gt => format!("{label} > :_{label}"),
        Operator::Lt => format!("{label} < :_{label}"),
        Operator::Ge => format!("{label} >= :_{label}"),
        Operator::Le => format!("{label} <= :_{label}"),
        Operator::Contains => format!("{label} LIKE :_{label}"),
        Operator::NotContains => format!("{label} NOT LIKE :_{label}"),
        Operator::Between => format!("{label} BETWEEN :_{label}1 AND :_{label}2"),
        Operator::In | Operator::NotIn => {
            if len < 1 {
                return Err(QuillError::MismatchedConstraint(format!(
                    "IN over '{label}' needs at least one placeholder"
                )));
            }
            let placeholders: Vec<String> =
                (1..=len).map(|n| format!(":_{label}{n}")).collect();
            let keyword = if op == Operator::In { "IN" } else { "NOT IN" };
            format!("{label} {keyword} ({})", placeholders.join(", "))
        }
        Operator::IsNull => format!("{label} IS NULL"),
        Operator::IsNotNull => format!("{label} IS NOT NULL"),
    })
}

/// Sort direction for an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One ORDER BY entry; caller order is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: &'static str,
    pub direction: Direction,
}

/// Ascending ordering over a filter-shape field.
pub fn asc(field: &'static str) -> Ordering {
    Ordering {
        field,
        direction: Direction::Asc,
    }
}

/// Descending ordering over a filter-shape field.
pub fn desc(field: &'static str) -> Ordering {
    Ordering {
        field,
        direction: Direction::Desc,
    }
}

pub(crate) fn render_orderings(
    orderings: &[Ordering],
    fields: &'static [FieldDef],
) -> QuillResult<String> {
    let parts: Vec<String> = orderings
        .iter()
        .map(|o| {
            if field(fields, o.field).is_none() {
                return Err(QuillError::InvalidNamingConvention {
                    field: o.field.to_owned(),
                    shape: "filter",
                });
            }
            let dir = match o.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            Ok(format!("{} {}", o.field, dir))
        })
        .collect::<QuillResult<_>>()?;
    Ok(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::FieldDef;
    use crate::types::Descriptor;

    const FIELDS: &[FieldDef] = &[
        FieldDef::new("name", Descriptor::Text, false),
        FieldDef::new("age", Descriptor::Int, false),
    ];

    #[test]
    fn test_comparison_tokens() {
        for (op, rendered) in [
            (Operator::Eq, "age = :_age"),
            (Operator::Ne, "age != :_age"),
            (Operator::Gt, "age > :_age"),
            (Operator::Lt, "age < :_age"),
            (Operator::Ge, "age >= :_age"),
            (Operator::Le, "age <= :_age"),
            (Operator::IsNull, "age IS NULL"),
            (Operator::IsNotNull, "age IS NOT NULL"),
        ] {
            let sql = render_clauses(&[filter("age", op, 0)], FIELDS).unwrap();
            assert_eq!(sql, rendered);
        }
    }

    #[test]
    fn test_between_and_in() {
        let sql = render_clauses(&[filter("age", Operator::Between, 0)], FIELDS).unwrap();
        assert_eq!(sql, "age BETWEEN :_age1 AND :_age2");
        let sql = render_clauses(&[filter("age", Operator::In, 3)], FIELDS).unwrap();
        assert_eq!(sql, "age IN (:_age1, :_age2, :_age3)");
        let sql = render_clauses(&[filter("age", Operator::NotIn, 2)], FIELDS).unwrap();
        assert_eq!(sql, "age NOT IN (:_age1, :_age2)");
    }

    #[test]
    fn test_in_needs_a_placeholder() {
        let err = render_clauses(&[filter("age", Operator::In, 0)], FIELDS).unwrap_err();
        assert!(matches!(err, QuillError::MismatchedConstraint(_)));
    }

    #[test]
    fn test_pattern_needs_text_field() {
        let sql = render_clauses(&[filter("name", Operator::Contains, 0)], FIELDS).unwrap();
        assert_eq!(sql, "name LIKE :_name");
        let err = render_clauses(&[filter("age", Operator::Contains, 0)], FIELDS).unwrap_err();
        assert!(matches!(err, QuillError::MismatchedConstraint(_)));
    }

    #[test]
    fn test_group_and_chain() {
        let sql = render_clauses(
            &[group([
                filter("name", Operator::Eq, 0),
                chain(Connective::And),
                filter("age", Operator::In, 2),
            ])],
            FIELDS,
        )
        .unwrap();
        assert_eq!(sql, "(name = :_name AND age IN (:_age1, :_age2))");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = render_clauses(&[filter("email", Operator::Eq, 0)], FIELDS).unwrap_err();
        assert!(matches!(err, QuillError::InvalidNamingConvention { .. }));
    }

    #[test]
    fn test_orderings() {
        let sql = render_orderings(&[asc("name"), desc("age")], FIELDS).unwrap();
        assert_eq!(sql, "name ASC, age DESC");
        let err = render_orderings(&[asc("email")], FIELDS).unwrap_err();
        assert!(matches!(err, QuillError::InvalidNamingConvention { .. }));
    }
}
