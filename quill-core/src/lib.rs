//! Typed statement builder and bind/extract engine over SQLite.
//!
//! Quill turns user-declared record shapes into prepared SQL statements
//! and bidirectional value converters: application code never writes
//! raw SQL for routine work and never performs per-column bind or
//! extract calls by hand.
//!
//! ```ignore
//! use quill_core::prelude::*;
//!
//! let conn = Connection::open(Location::Memory)?;
//! conn.exec(&schema::create_table::<User>("users"))?;
//!
//! let sql = builder::create::<User>("users", OnConflict::Abort).statement()?;
//! let mut crud = Crud::prepare(&conn, &sql)?;
//! crud.exec(&user)?;
//! ```

pub mod admin;
pub mod bind;
pub mod builder;
pub mod crud;
pub mod driver;
pub mod error;
pub mod extract;
pub mod ident;
pub mod schema;
pub mod shape;
pub mod types;

// Re-exported for the generated derive code.
pub use serde_json;

pub use crud::Crud;
pub use driver::{init, shutdown, Connection, Location, RowBuffer, Statement, Step, Threading};
pub use error::{QuillError, QuillResult};
pub use ident::Uuid7;

pub mod prelude {
    pub use crate::admin;
    pub use crate::builder::{
        self, asc, chain, desc, filter, group, Clause, Connective, Direction, Gate, OnConflict,
        Operator, Ordering,
    };
    pub use crate::crud::Crud;
    pub use crate::driver::{init, shutdown, Connection, Location, RowBuffer, Step, Threading};
    pub use crate::error::{QuillError, QuillResult};
    pub use crate::extract::Row;
    pub use crate::ident::Uuid7;
    pub use crate::schema::create_table;
    pub use crate::shape::{Enumeration, FieldDef, Filter, Model, View};
    pub use crate::types::{Argument, Bindable, ColumnTag, Descriptor, Storage};
}
