//! Invoices for committed orders.
//!
//! - [`document`]: format-independent layout with GST and pagination
//! - [`render`]: PDF output
//! - [`storage`]: keyed file storage (local directory or in memory)
//! - [`generator`]: loads an order, renders and stores its invoice
//! - [`dispatch`]: background worker fed by a queue

pub mod dispatch;
pub mod document;
pub mod error;
pub mod generator;
pub mod render;
pub mod storage;

pub use dispatch::InvoiceDispatcher;
pub use document::{
    GST_PERCENT, InvoiceDocument, InvoicePage, InvoiceRow, InvoiceSummary, invoice_key,
};
pub use error::{InvoiceError, Result};
pub use generator::InvoiceGenerator;
pub use render::render_pdf;
pub use storage::{FsInvoiceStorage, InMemoryInvoiceStorage, InvoiceStorage};
