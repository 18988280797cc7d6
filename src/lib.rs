//! # Quill: shapes in, SQL out
//!
//! A thin, opinionated layer over SQLite: declare record shapes as
//! structs, derive their `Model`/`View`/`Filter` impls, and let the
//! builders emit the SQL while the engines move values in and out of
//! prepared statements.
//!
//! ```ignore
//! use quill::prelude::*;
//!
//! #[derive(Model)]
//! struct User {
//!     #[quill(cast = "blob")]
//!     uuid: Vec<u8>,
//!     #[quill(cast = "text")]
//!     name: String,
//!     age: i64,
//! }
//!
//! let conn = Connection::open(Location::Memory)?;
//! conn.exec(&create_table::<User>("users"))?;
//!
//! let sql = builder::create::<User>("users", OnConflict::Abort).statement()?;
//! let mut crud = Crud::prepare(&conn, &sql)?;
//! crud.exec(&user)?;
//! ```

pub use quill_core::*;
pub use quill_macros::{Enumeration, Filter, Model, View};

pub mod prelude {
    pub use quill_core::prelude::*;
    pub use quill_macros::{Enumeration, Filter, Model, View};
}
