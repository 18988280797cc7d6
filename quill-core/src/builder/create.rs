//! INSERT statement assembly.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::{QuillError, QuillResult};
use crate::shape::Model;

/// Conflict action selector for inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Plain `INSERT`.
    Abort,
    /// `INSERT OR REPLACE`.
    Replace,
    /// `INSERT OR IGNORE`.
    Ignore,
}

/// Builder for `INSERT INTO <container> (…) VALUES (…)` with `:field`
/// bind placeholders for every model field.
pub struct Create<M: Model> {
    sql: String,
    _model: PhantomData<M>,
}

/// Start an insert of the model shape into `container`.
pub fn create<M: Model>(container: &str, on_conflict: OnConflict) -> Create<M> {
    let verb = match on_conflict {
        OnConflict::Abort => "INSERT",
        OnConflict::Replace => "INSERT OR REPLACE",
        OnConflict::Ignore => "INSERT OR IGNORE",
    };
    let labels: Vec<&str> = M::FIELDS.iter().map(|f| f.label).collect();
    let placeholders: Vec<String> = labels.iter().map(|l| format!(":{l}")).collect();
    Create {
        sql: format!(
            "{} INTO {} ({}) VALUES ({})",
            verb,
            container,
            labels.join(", "),
            placeholders.join(", ")
        ),
        _model: PhantomData,
    }
}

impl<M: Model> Create<M> {
    /// Emit the final SQL text, terminated with `;`.
    pub fn statement(self) -> QuillResult<String> {
        if self.sql.ends_with(';') {
            return Err(QuillError::chain("statement", "text is already terminated"));
        }
        let sql = format!("{};", self.sql);
        debug!(%sql, "built create statement");
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuillResult;
    use crate::shape::{FieldDef, Model};
    use crate::types::{Bindable, Descriptor};

    struct UserModel;

    impl Model for UserModel {
        const FIELDS: &'static [FieldDef] = &[
            FieldDef::new("uuid", Descriptor::Blob, false),
            FieldDef::new("name", Descriptor::TextBytes, false),
        ];

        fn bind_value(&self, _index: usize) -> QuillResult<Bindable<'_>> {
            Ok(Bindable::Null)
        }
    }

    #[test]
    fn test_insert() {
        let sql = create::<UserModel>("users", OnConflict::Abort)
            .statement()
            .unwrap();
        assert_eq!(sql, "INSERT INTO users (uuid, name) VALUES (:uuid, :name);");
    }

    #[test]
    fn test_insert_or_replace() {
        let sql = create::<UserModel>("users", OnConflict::Replace)
            .statement()
            .unwrap();
        assert!(sql.starts_with("INSERT OR REPLACE INTO users"));
    }

    #[test]
    fn test_insert_or_ignore() {
        let sql = create::<UserModel>("users", OnConflict::Ignore)
            .statement()
            .unwrap();
        assert!(sql.starts_with("INSERT OR IGNORE INTO users"));
    }
}
