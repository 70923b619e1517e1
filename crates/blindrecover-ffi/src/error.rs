use std::cell::RefCell;
use std::ffi::CString;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrecStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorInsufficientData = 2,
    ErrorInternal = 3,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `brec_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Execute a closure that returns a `BrecStatus`, catching any panics and
/// converting them into `BrecStatus::ErrorInternal` rather than unwinding
/// across the FFI boundary.
pub fn catch_panic<F: FnOnce() -> BrecStatus + std::panic::UnwindSafe>(f: F) -> BrecStatus {
    match std::panic::catch_unwind(f) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            BrecStatus::ErrorInternal
        }
    }
}
