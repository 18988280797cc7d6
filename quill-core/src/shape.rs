//! Shape traits implemented by the derive macros.
//!
//! A shape is a named ordered sequence of labelled fields. Models describe
//! how a row is written, views how it is read, filters which labels may
//! appear in WHERE and ORDER BY. The derive macros in `quill-macros`
//! validate shapes at compile time and generate these impls.

use crate::error::QuillResult;
use crate::extract::Row;
use crate::types::{Bindable, Descriptor};

/// One labelled field of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub label: &'static str,
    pub descriptor: Descriptor,
    pub optional: bool,
}

impl FieldDef {
    pub const fn new(label: &'static str, descriptor: Descriptor, optional: bool) -> Self {
        Self {
            label,
            descriptor,
            optional,
        }
    }
}

/// A write shape. Contains a non-optional `uuid` field annotated as a
/// blob cast; the derive rejects anything else.
pub trait Model {
    const FIELDS: &'static [FieldDef];

    /// Produce the bindable value for the field at `index` in
    /// declaration order. JSON fields encode here; absent optionals
    /// yield [`Bindable::Null`].
    fn bind_value(&self, index: usize) -> QuillResult<Bindable<'_>>;
}

/// A read shape populated from a stepped row.
pub trait View: Sized {
    const FIELDS: &'static [FieldDef];

    /// Extract one value of this shape from the current row.
    fn from_row(row: &Row<'_, '_>) -> QuillResult<Self>;
}

/// A shape restricting which labels filters and orderings may use.
pub trait Filter {
    const FIELDS: &'static [FieldDef];
}

/// A fieldless enumeration mapped to INTEGER ordinals or TEXT names.
pub trait Enumeration: Sized {
    fn ordinal(&self) -> i32;
    fn from_ordinal(ordinal: i32) -> Option<Self>;
    fn variant_name(&self) -> &'static str;
    fn from_variant_name(name: &str) -> Option<Self>;
}

/// Look up a field by label.
pub fn field<'a>(fields: &'a [FieldDef], label: &str) -> Option<&'a FieldDef> {
    fields.iter().find(|f| f.label == label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Descriptor;

    #[test]
    fn test_field_lookup() {
        const FIELDS: &[FieldDef] = &[
            FieldDef::new("uuid", Descriptor::Blob, false),
            FieldDef::new("age", Descriptor::Int, true),
        ];
        assert_eq!(field(FIELDS, "age").unwrap().descriptor, Descriptor::Int);
        assert!(field(FIELDS, "name").is_none());
    }
}
