//! HTTP middleware.
//!
//! Execution order (outermost to innermost):
//! 1. Request log, on every route
//! 2. Admin gate, on `/admin/*` except `/admin/auth`

pub mod admin;
pub mod request_log;
