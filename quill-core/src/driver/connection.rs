//! Database handle: open/close, error message access, and the one-shot
//! exec path with its owned row buffer.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;

use libsqlite3_sys as ffi;
use tracing::{debug, warn};

use super::{errmsg, Statement};
use crate::error::{QuillError, QuillResult};

/// Where a connection's database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Private in-memory instance, discarded on close.
    Memory,
    /// Database file, created if absent.
    Path(String),
}

impl Location {
    fn as_path(&self) -> &str {
        match self {
            Location::Memory => ":memory:",
            Location::Path(p) => p.as_str(),
        }
    }
}

/// One open database handle.
#[derive(Debug)]
pub struct Connection {
    pub(crate) db: *mut ffi::sqlite3,
}

impl Connection {
    /// Open the database at `location`, creating a file as needed.
    pub fn open(location: Location) -> QuillResult<Self> {
        let path = location.as_path();
        let c_path = CString::new(path).map_err(|_| QuillError::UnableToOpen {
            path: path.to_owned(),
            message: "path contains a NUL byte".to_owned(),
        })?;
        let flags = ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };
        if rc != ffi::SQLITE_OK {
            let message = if db.is_null() {
                "out of memory".to_owned()
            } else {
                let m = errmsg(db);
                unsafe { ffi::sqlite3_close(db) };
                m
            };
            return Err(QuillError::UnableToOpen {
                path: path.to_owned(),
                message,
            });
        }
        debug!(path, "opened database");
        Ok(Self { db })
    }

    /// The engine's message for the most recent failure on this handle.
    pub fn err_msg(&self) -> String {
        errmsg(self.db)
    }

    /// Run a possibly multi-statement script, buffering every produced
    /// row as text. Intended for pragmas, DDL, and small results; data
    /// paths go through prepared statements.
    pub fn exec(&self, sql: &str) -> QuillResult<RowBuffer> {
        let c_sql = CString::new(sql)
            .map_err(|_| QuillError::UnableToExecuteQuery("SQL contains a NUL byte".to_owned()))?;
        let mut buffer = RowBuffer { rows: Vec::new() };
        let mut c_err: *mut c_char = ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_exec(
                self.db,
                c_sql.as_ptr(),
                Some(collect_row),
                &mut buffer as *mut RowBuffer as *mut c_void,
                &mut c_err,
            )
        };
        if rc != ffi::SQLITE_OK {
            let message = if c_err.is_null() {
                errmsg(self.db)
            } else {
                unsafe {
                    let m = CStr::from_ptr(c_err).to_string_lossy().into_owned();
                    ffi::sqlite3_free(c_err as *mut c_void);
                    m
                }
            };
            return Err(match rc & 0xff {
                ffi::SQLITE_MISUSE => QuillError::InterfaceMisuse(message),
                ffi::SQLITE_CONSTRAINT => QuillError::UnmetConstraint(message),
                _ => QuillError::UnableToExecuteQuery(message),
            });
        }
        Ok(buffer)
    }

    /// Compile the first statement of `sql`; any tail is ignored.
    pub fn prepare(&self, sql: &str) -> QuillResult<Statement<'_>> {
        Statement::prepare(self, sql)
    }

    /// Close the handle. Errors are logged, not raised; close runs on
    /// teardown paths.
    pub fn close(self) {
        // Drop does the work.
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.db.is_null() {
            return;
        }
        let rc = unsafe { ffi::sqlite3_close(self.db) };
        if rc != ffi::SQLITE_OK {
            warn!(rc, "sqlite3_close failed");
        }
        self.db = ptr::null_mut();
    }
}

/// Row callback: copy each `(name, text)` pair into the owned buffer.
unsafe extern "C" fn collect_row(
    state: *mut c_void,
    n_cols: c_int,
    values: *mut *mut c_char,
    names: *mut *mut c_char,
) -> c_int {
    let buffer = &mut *(state as *mut RowBuffer);
    let mut columns = Vec::with_capacity(n_cols as usize);
    for i in 0..n_cols as isize {
        let name_ptr = *names.offset(i);
        let name = if name_ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(name_ptr).to_string_lossy().into_owned()
        };
        let value_ptr = *values.offset(i);
        let value = if value_ptr.is_null() {
            None
        } else {
            Some(CStr::from_ptr(value_ptr).to_string_lossy().into_owned())
        };
        columns.push((name, value));
    }
    buffer.rows.push(BufferedRow { columns });
    0
}

/// One row delivered by [`Connection::exec`], all values in text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedRow {
    columns: Vec<(String, Option<String>)>,
}

impl BufferedRow {
    /// Ordered `(label, text)` pairs; NULL columns are `None`.
    pub fn columns(&self) -> &[(String, Option<String>)] {
        &self.columns
    }

    /// Text of the column with the given label, if present and non-NULL.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == label)
            .and_then(|(_, value)| value.as_deref())
    }
}

/// Owned result of the one-shot exec path. Released on drop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RowBuffer {
    rows: Vec<BufferedRow>,
}

impl RowBuffer {
    pub fn rows(&self) -> &[BufferedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&BufferedRow> {
        self.rows.first()
    }
}

impl<'a> IntoIterator for &'a RowBuffer {
    type Item = &'a BufferedRow;
    type IntoIter = std::slice::Iter<'a, BufferedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
