//! Safe shim over the SQLite C API.
//!
//! Everything FFI lives in this module: process-wide initialization,
//! connections, one-shot scripts, and prepared statements. The rest of
//! the crate speaks only through these types.

mod connection;
mod statement;

pub use connection::{BufferedRow, Connection, Location, RowBuffer};
pub use statement::{Statement, Step};

use std::ffi::CStr;

use libsqlite3_sys as ffi;

use crate::error::{QuillError, QuillResult};

/// Engine threading discipline, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threading {
    /// No internal locking; the caller ensures exclusive use.
    SingleThread,
    /// Distinct handles may be used from distinct threads; a single
    /// handle must not be shared.
    MultiThread,
    /// The engine serialises access to a shared handle.
    Serialized,
}

/// Configure the engine's threading discipline and initialize it.
///
/// Must run before the first [`Connection::open`]; call [`shutdown`]
/// at process end.
pub fn init(threading: Threading) -> QuillResult<()> {
    let mode = match threading {
        Threading::SingleThread => ffi::SQLITE_CONFIG_SINGLETHREAD,
        Threading::MultiThread => ffi::SQLITE_CONFIG_MULTITHREAD,
        Threading::Serialized => ffi::SQLITE_CONFIG_SERIALIZED,
    };
    // Config is refused with MISUSE once the engine is initialized.
    let rc = unsafe { ffi::sqlite3_config(mode) };
    if rc != ffi::SQLITE_OK {
        return Err(QuillError::InterfaceMisuse(format!(
            "sqlite3_config({threading:?}) returned {rc}"
        )));
    }
    let rc = unsafe { ffi::sqlite3_initialize() };
    if rc != ffi::SQLITE_OK {
        return Err(QuillError::InterfaceMisuse(format!(
            "sqlite3_initialize returned {rc}"
        )));
    }
    Ok(())
}

/// Release all engine resources. Call after every connection is closed.
pub fn shutdown() -> QuillResult<()> {
    let rc = unsafe { ffi::sqlite3_shutdown() };
    if rc != ffi::SQLITE_OK {
        return Err(QuillError::InterfaceMisuse(format!(
            "sqlite3_shutdown returned {rc}"
        )));
    }
    Ok(())
}

/// Collapse a native return code into the error taxonomy, attaching the
/// connection's current error message.
pub(crate) fn check(rc: i32, db: *mut ffi::sqlite3) -> QuillResult<()> {
    if rc == ffi::SQLITE_OK {
        return Ok(());
    }
    Err(code_to_error(rc, db))
}

pub(crate) fn code_to_error(rc: i32, db: *mut ffi::sqlite3) -> QuillError {
    let message = errmsg(db);
    // Constraint codes carry extended detail in the low byte.
    match rc & 0xff {
        ffi::SQLITE_MISUSE => QuillError::InterfaceMisuse(message),
        ffi::SQLITE_CONSTRAINT => QuillError::UnmetConstraint(message),
        _ => QuillError::UnableToExecuteQuery(message),
    }
}

/// Copy the engine's current error message for a handle.
pub(crate) fn errmsg(db: *mut ffi::sqlite3) -> String {
    if db.is_null() {
        return "no database handle".to_owned();
    }
    unsafe {
        let ptr = ffi::sqlite3_errmsg(db);
        if ptr.is_null() {
            "unknown engine error".to_owned()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }
}
