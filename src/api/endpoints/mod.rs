//! API endpoint handlers, one module per resource.

pub mod admin;
pub mod agencies;
pub mod ai;
pub mod contacts;
pub mod employees;
pub mod logs;
pub mod offices;
pub mod production;
pub mod reinsurance;
pub mod root;
pub mod submissions;
pub mod tasks;
