//! The bind engine: walk a model record and apply each field to its
//! `:field` placeholder on a prepared statement.

use crate::driver::Statement;
use crate::error::{QuillError, QuillResult};
use crate::shape::Model;
use crate::types::{Argument, Bindable};

/// Bind every field of `record` to the statement.
///
/// Precondition: the statement's model placeholders (`:field`, not
/// `:_field`) must correspond one-to-one with the record's fields;
/// otherwise `MismatchedFields`. Filter placeholders in the same
/// statement are left untouched for [`bind_filter`].
pub fn bind_record<M: Model>(stmt: &mut Statement<'_>, record: &M) -> QuillResult<()> {
    check_model_placeholders(stmt, M::FIELDS.len())?;
    for (i, def) in M::FIELDS.iter().enumerate() {
        let index = stmt.parameter_index(&format!(":{}", def.label))?;
        match record.bind_value(i)? {
            Bindable::Null => stmt.bind_null(index)?,
            Bindable::Int(v) => stmt.bind_int64(index, v)?,
            Bindable::Bool(v) => stmt.bind_int32(index, if v { 1 } else { 0 })?,
            Bindable::Float(v) => stmt.bind_double(index, v)?,
            Bindable::Ordinal(v) => stmt.bind_int32(index, v)?,
            Bindable::VariantName(v) => stmt.bind_text(index, v)?,
            Bindable::Text(v) => stmt.bind_text(index, v)?,
            Bindable::Blob(v) => stmt.bind_blob(index, v)?,
            // The scratch string is copied into the engine and dropped
            // when this arm ends.
            Bindable::Json(v) => stmt.bind_text(index, &v)?,
        }
    }
    Ok(())
}

/// Every non-filter placeholder must be a model field, and the model
/// must fill all of them.
fn check_model_placeholders(stmt: &Statement<'_>, field_count: usize) -> QuillResult<()> {
    let mut model_placeholders = 0;
    for i in 1..=stmt.parameter_count() {
        let Some(name) = stmt.parameter_name(i) else {
            return Err(QuillError::fields(format!(
                "placeholder {i} is positional, expected a named one"
            )));
        };
        if !name.starts_with(":_") {
            model_placeholders += 1;
        }
    }
    if model_placeholders != field_count {
        return Err(QuillError::fields(format!(
            "statement has {model_placeholders} bind placeholders, shape has {field_count} fields"
        )));
    }
    Ok(())
}

/// Bind a scalar filter argument to its `:_field` placeholder.
pub fn bind_filter(stmt: &mut Statement<'_>, label: &str, arg: Argument<'_>) -> QuillResult<()> {
    bind_argument(stmt, &format!(":_{label}"), arg)
}

/// Bind the `n`-th filter argument of a `between`/`in` operator
/// (`:_field1`, `:_field2`, …). `n` is 1-based.
pub fn bind_filter_at(
    stmt: &mut Statement<'_>,
    label: &str,
    n: usize,
    arg: Argument<'_>,
) -> QuillResult<()> {
    bind_argument(stmt, &format!(":_{label}{n}"), arg)
}

fn bind_argument(stmt: &mut Statement<'_>, name: &str, arg: Argument<'_>) -> QuillResult<()> {
    let index = stmt.parameter_index(name)?;
    match arg {
        Argument::Null => stmt.bind_null(index),
        Argument::Int(v) => stmt.bind_int64(index, v),
        Argument::Bool(v) => stmt.bind_int32(index, if v { 1 } else { 0 }),
        Argument::Float(v) => stmt.bind_double(index, v),
        Argument::Text(v) => stmt.bind_text(index, v),
        Argument::Blob(v) => stmt.bind_blob(index, v),
    }
}
