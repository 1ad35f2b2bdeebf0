//! HTTP handlers grouped by resource.

pub mod addresses;
pub mod admin;
pub mod orders;
pub mod system;
