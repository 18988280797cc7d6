//! The extract engine: typed column reads from a stepped row into a
//! view shape, enforcing tag and shape compatibility.

use serde::de::DeserializeOwned;

use crate::driver::Statement;
use crate::error::{QuillError, QuillResult};
use crate::shape::{Enumeration, FieldDef};
use crate::types::ColumnTag;

/// One engine row, addressed by column label. Created after a
/// `Step::Row`; all reads copy, so extracted values outlive the next
/// step or reset.
pub struct Row<'s, 'conn> {
    stmt: &'s Statement<'conn>,
    columns: Vec<(String, usize)>,
}

impl<'s, 'conn> Row<'s, 'conn> {
    pub fn new(stmt: &'s Statement<'conn>) -> QuillResult<Self> {
        let mut columns = Vec::with_capacity(stmt.column_count());
        for i in 0..stmt.column_count() {
            columns.push((stmt.column_name(i)?, i));
        }
        Ok(Self { stmt, columns })
    }

    /// Column count and label multiset must match the view shape;
    /// checked before any extraction.
    pub fn check_shape(&self, fields: &[FieldDef]) -> QuillResult<()> {
        if self.columns.len() != fields.len() {
            return Err(QuillError::fields(format!(
                "row has {} columns, shape has {} fields",
                self.columns.len(),
                fields.len()
            )));
        }
        for def in fields {
            if !self.columns.iter().any(|(name, _)| name == def.label) {
                return Err(QuillError::fields(format!(
                    "row has no column labelled '{}'",
                    def.label
                )));
            }
        }
        // Equal length plus struct-unique labels makes the multisets equal.
        Ok(())
    }

    fn index(&self, label: &str) -> QuillResult<usize> {
        self.columns
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, i)| *i)
            .ok_or_else(|| QuillError::fields(format!("row has no column labelled '{label}'")))
    }

    fn tagged(&self, label: &str, expected: &'static str, want: ColumnTag) -> QuillResult<usize> {
        let index = self.index(label)?;
        let tag = self.stmt.column_tag(index);
        if tag == ColumnTag::Null {
            return Err(QuillError::UnexpectedNullValue {
                column: label.to_owned(),
            });
        }
        if tag != want {
            return Err(QuillError::MismatchedType {
                column: label.to_owned(),
                expected,
                actual: tag,
            });
        }
        Ok(index)
    }

    fn is_null(&self, label: &str) -> QuillResult<bool> {
        Ok(self.stmt.column_tag(self.index(label)?) == ColumnTag::Null)
    }

    // ---- mandatory reads ----

    /// Integer column into a 64-bit value.
    pub fn read_int(&self, label: &str) -> QuillResult<i64> {
        let index = self.tagged(label, "INTEGER", ColumnTag::Integer)?;
        Ok(self.stmt.column_int64(index))
    }

    /// Integer column restricted to the domain {0, 1}.
    pub fn read_bool(&self, label: &str) -> QuillResult<bool> {
        let index = self.tagged(label, "INTEGER", ColumnTag::Integer)?;
        match self.stmt.column_int64(index) {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(QuillError::MismatchedValue {
                column: label.to_owned(),
                value: other.to_string(),
            }),
        }
    }

    /// Float column.
    pub fn read_float(&self, label: &str) -> QuillResult<f64> {
        let index = self.tagged(label, "REAL", ColumnTag::Float)?;
        Ok(self.stmt.column_double(index))
    }

    /// Text or blob column, copied out raw.
    pub fn read_slice(&self, label: &str) -> QuillResult<Vec<u8>> {
        let index = self.index(label)?;
        match self.stmt.column_tag(index) {
            ColumnTag::Text => Ok(self.stmt.column_text(index).unwrap_or_default()),
            ColumnTag::Blob => Ok(self.stmt.column_blob(index).unwrap_or_default()),
            ColumnTag::Null => Err(QuillError::UnexpectedNullValue {
                column: label.to_owned(),
            }),
            tag => Err(QuillError::MismatchedType {
                column: label.to_owned(),
                expected: "TEXT or BLOB",
                actual: tag,
            }),
        }
    }

    /// Enumeration from an INTEGER ordinal or a TEXT variant name.
    pub fn read_enum<E: Enumeration>(&self, label: &str) -> QuillResult<E> {
        let index = self.index(label)?;
        match self.stmt.column_tag(index) {
            ColumnTag::Integer => {
                let stored = self.stmt.column_int64(index);
                let ordinal = i32::try_from(stored).map_err(|_| QuillError::MismatchedSize {
                    column: label.to_owned(),
                    expected: 32,
                })?;
                E::from_ordinal(ordinal).ok_or_else(|| QuillError::MismatchedValue {
                    column: label.to_owned(),
                    value: ordinal.to_string(),
                })
            }
            ColumnTag::Text => {
                let bytes = self.stmt.column_text(index).unwrap_or_default();
                let name = String::from_utf8_lossy(&bytes);
                E::from_variant_name(&name).ok_or_else(|| QuillError::MismatchedValue {
                    column: label.to_owned(),
                    value: name.into_owned(),
                })
            }
            ColumnTag::Null => Err(QuillError::UnexpectedNullValue {
                column: label.to_owned(),
            }),
            tag => Err(QuillError::MismatchedType {
                column: label.to_owned(),
                expected: "INTEGER or TEXT",
                actual: tag,
            }),
        }
    }

    /// Nested record or sequence, JSON-decoded from a TEXT column.
    pub fn read_json<T: DeserializeOwned>(&self, label: &str) -> QuillResult<T> {
        let index = self.tagged(label, "TEXT", ColumnTag::Text)?;
        let bytes = self.stmt.column_text(index).unwrap_or_default();
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ---- optional reads: NULL yields None ----

    pub fn read_opt_int(&self, label: &str) -> QuillResult<Option<i64>> {
        if self.is_null(label)? {
            return Ok(None);
        }
        self.read_int(label).map(Some)
    }

    pub fn read_opt_bool(&self, label: &str) -> QuillResult<Option<bool>> {
        if self.is_null(label)? {
            return Ok(None);
        }
        self.read_bool(label).map(Some)
    }

    pub fn read_opt_float(&self, label: &str) -> QuillResult<Option<f64>> {
        if self.is_null(label)? {
            return Ok(None);
        }
        self.read_float(label).map(Some)
    }

    pub fn read_opt_slice(&self, label: &str) -> QuillResult<Option<Vec<u8>>> {
        if self.is_null(label)? {
            return Ok(None);
        }
        self.read_slice(label).map(Some)
    }

    pub fn read_opt_enum<E: Enumeration>(&self, label: &str) -> QuillResult<Option<E>> {
        if self.is_null(label)? {
            return Ok(None);
        }
        self.read_enum(label).map(Some)
    }

    pub fn read_opt_json<T: DeserializeOwned>(&self, label: &str) -> QuillResult<Option<T>> {
        if self.is_null(label)? {
            return Ok(None);
        }
        self.read_json(label).map(Some)
    }
}
