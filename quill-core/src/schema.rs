//! CREATE TABLE emission from a model shape.
//!
//! The shape itself is validated by the derive macro (mandatory
//! non-optional `uuid` blob field), so emission is total.

use crate::shape::{FieldDef, Model};

/// Emit the container-create statement for a model shape.
///
/// Every container is declared `STRICT, WITHOUT ROWID` with the `uuid`
/// field as primary key; non-optional fields carry `NOT NULL`.
pub fn create_table<M: Model>(container: &str) -> String {
    render_create_table(M::FIELDS, container)
}

pub(crate) fn render_create_table(fields: &[FieldDef], container: &str) -> String {
    let mut sql = String::from("CREATE TABLE IF NOT EXISTS ");
    sql.push_str(container);
    sql.push_str(" (\n");

    let mut lines = Vec::with_capacity(fields.len());
    for field in fields {
        let mut line = format!("\t{} {}", field.label, field.descriptor.storage().column_decl());
        if field.label == "uuid" {
            // PRIMARY KEY is implicitly non-null.
            line.push_str(" PRIMARY KEY");
        } else if !field.optional {
            line.push_str(" NOT NULL");
        }
        lines.push(line);
    }
    sql.push_str(&lines.join(",\n"));
    sql.push_str("\n) STRICT, WITHOUT ROWID;");
    sql
}
