//! Prepared statements: bind by index, step, and typed column reads.
//!
//! Text and blob reads always copy out of the engine's scratch space so
//! the result outlives the next step or reset. Bound text and blobs are
//! copied into the engine (`SQLITE_TRANSIENT`), so the caller's bytes
//! are free the moment the bind call returns.

use std::ffi::{c_int, c_void, CStr, CString};
use std::marker::PhantomData;
use std::ptr;

use libsqlite3_sys as ffi;
use tracing::warn;

use super::{check, code_to_error, Connection};
use crate::error::{QuillError, QuillResult};
use crate::types::ColumnTag;

/// Outcome of stepping a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A row is available for column reads.
    Row,
    /// The statement has run to completion.
    Done,
}

/// One compiled statement, owned uniquely. Finalized on drop.
pub struct Statement<'conn> {
    pub(crate) stmt: *mut ffi::sqlite3_stmt,
    pub(crate) db: *mut ffi::sqlite3,
    _conn: PhantomData<&'conn Connection>,
}

impl<'conn> Statement<'conn> {
    /// Compile one statement with the persistent hint; any SQL tail is
    /// ignored.
    pub(crate) fn prepare(conn: &'conn Connection, sql: &str) -> QuillResult<Self> {
        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_prepare_v3(
                conn.db,
                sql.as_ptr() as *const _,
                sql.len() as c_int,
                ffi::SQLITE_PREPARE_PERSISTENT,
                &mut stmt,
                ptr::null_mut(),
            )
        };
        check(rc, conn.db)?;
        if stmt.is_null() {
            return Err(QuillError::UnableToExecuteQuery(
                "SQL compiled to an empty statement".to_owned(),
            ));
        }
        Ok(Self {
            stmt,
            db: conn.db,
            _conn: PhantomData,
        })
    }

    // ---- parameters ----

    /// Number of placeholders in the compiled statement.
    pub fn parameter_count(&self) -> usize {
        unsafe { ffi::sqlite3_bind_parameter_count(self.stmt) as usize }
    }

    /// 1-based index of a named placeholder.
    pub fn parameter_index(&self, name: &str) -> QuillResult<usize> {
        let c_name = CString::new(name)
            .map_err(|_| QuillError::BindParameterNotFound(name.to_owned()))?;
        let idx = unsafe { ffi::sqlite3_bind_parameter_index(self.stmt, c_name.as_ptr()) };
        if idx == 0 {
            return Err(QuillError::BindParameterNotFound(name.to_owned()));
        }
        Ok(idx as usize)
    }

    /// Name of the placeholder at a 1-based index, if it has one.
    pub fn parameter_name(&self, index: usize) -> Option<String> {
        unsafe {
            let ptr = ffi::sqlite3_bind_parameter_name(self.stmt, index as c_int);
            if ptr.is_null() {
                None
            } else {
                Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
            }
        }
    }

    // ---- binds (1-based index) ----

    pub fn bind_null(&mut self, index: usize) -> QuillResult<()> {
        check(unsafe { ffi::sqlite3_bind_null(self.stmt, index as c_int) }, self.db)
    }

    pub fn bind_int32(&mut self, index: usize, value: i32) -> QuillResult<()> {
        check(
            unsafe { ffi::sqlite3_bind_int(self.stmt, index as c_int, value) },
            self.db,
        )
    }

    pub fn bind_int64(&mut self, index: usize, value: i64) -> QuillResult<()> {
        check(
            unsafe { ffi::sqlite3_bind_int64(self.stmt, index as c_int, value) },
            self.db,
        )
    }

    pub fn bind_double(&mut self, index: usize, value: f64) -> QuillResult<()> {
        check(
            unsafe { ffi::sqlite3_bind_double(self.stmt, index as c_int, value) },
            self.db,
        )
    }

    pub fn bind_text(&mut self, index: usize, value: &str) -> QuillResult<()> {
        let rc = unsafe {
            ffi::sqlite3_bind_text(
                self.stmt,
                index as c_int,
                value.as_ptr() as *const _,
                value.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        check(rc, self.db)
    }

    pub fn bind_blob(&mut self, index: usize, value: &[u8]) -> QuillResult<()> {
        if value.is_empty() {
            // Keeps the bound value BLOB-typed instead of NULL.
            let rc = unsafe { ffi::sqlite3_bind_zeroblob(self.stmt, index as c_int, 0) };
            return check(rc, self.db);
        }
        let rc = unsafe {
            ffi::sqlite3_bind_blob(
                self.stmt,
                index as c_int,
                value.as_ptr() as *const c_void,
                value.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        check(rc, self.db)
    }

    // ---- stepping ----

    pub fn step(&mut self) -> QuillResult<Step> {
        let rc = unsafe { ffi::sqlite3_step(self.stmt) };
        match rc {
            ffi::SQLITE_ROW => Ok(Step::Row),
            ffi::SQLITE_DONE => Ok(Step::Done),
            _ => Err(code_to_error(rc, self.db)),
        }
    }

    pub fn reset(&mut self) -> QuillResult<()> {
        // The return code repeats the prior step's failure, which was
        // already reported; a constraint violation must not make the
        // statement unresettable.
        unsafe { ffi::sqlite3_reset(self.stmt) };
        Ok(())
    }

    pub fn clear_bindings(&mut self) -> QuillResult<()> {
        check(unsafe { ffi::sqlite3_clear_bindings(self.stmt) }, self.db)
    }

    // ---- columns (0-based index, valid on Step::Row) ----

    pub fn column_count(&self) -> usize {
        unsafe { ffi::sqlite3_column_count(self.stmt) as usize }
    }

    pub fn column_name(&self, index: usize) -> QuillResult<String> {
        unsafe {
            let ptr = ffi::sqlite3_column_name(self.stmt, index as c_int);
            if ptr.is_null() {
                return Err(QuillError::InterfaceMisuse(format!(
                    "no column at index {index}"
                )));
            }
            Ok(CStr::from_ptr(ptr).to_string_lossy().into_owned())
        }
    }

    pub fn column_tag(&self, index: usize) -> ColumnTag {
        match unsafe { ffi::sqlite3_column_type(self.stmt, index as c_int) } {
            ffi::SQLITE_INTEGER => ColumnTag::Integer,
            ffi::SQLITE_FLOAT => ColumnTag::Float,
            ffi::SQLITE_TEXT => ColumnTag::Text,
            ffi::SQLITE_BLOB => ColumnTag::Blob,
            _ => ColumnTag::Null,
        }
    }

    pub fn column_bytes(&self, index: usize) -> usize {
        unsafe { ffi::sqlite3_column_bytes(self.stmt, index as c_int) as usize }
    }

    pub fn column_int32(&self, index: usize) -> i32 {
        unsafe { ffi::sqlite3_column_int(self.stmt, index as c_int) }
    }

    pub fn column_int64(&self, index: usize) -> i64 {
        unsafe { ffi::sqlite3_column_int64(self.stmt, index as c_int) }
    }

    pub fn column_double(&self, index: usize) -> f64 {
        unsafe { ffi::sqlite3_column_double(self.stmt, index as c_int) }
    }

    /// Copy the column's text form; `None` for NULL.
    pub fn column_text(&self, index: usize) -> Option<Vec<u8>> {
        unsafe {
            let ptr = ffi::sqlite3_column_text(self.stmt, index as c_int);
            if ptr.is_null() {
                return None;
            }
            let len = ffi::sqlite3_column_bytes(self.stmt, index as c_int) as usize;
            Some(std::slice::from_raw_parts(ptr, len).to_vec())
        }
    }

    /// Copy the column's blob form; `None` for NULL.
    pub fn column_blob(&self, index: usize) -> Option<Vec<u8>> {
        unsafe {
            let ptr = ffi::sqlite3_column_blob(self.stmt, index as c_int);
            let len = ffi::sqlite3_column_bytes(self.stmt, index as c_int) as usize;
            if ptr.is_null() {
                // A zero-length blob reads back as a null pointer.
                if self.column_tag(index) == ColumnTag::Null {
                    return None;
                }
                return Some(Vec::new());
            }
            Some(std::slice::from_raw_parts(ptr as *const u8, len).to_vec())
        }
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        if self.stmt.is_null() {
            return;
        }
        let rc = unsafe { ffi::sqlite3_finalize(self.stmt) };
        if rc != ffi::SQLITE_OK {
            warn!(rc, "sqlite3_finalize failed");
        }
        self.stmt = ptr::null_mut();
    }
}
