//! Builds, renders and stores invoices for committed orders.

use common::OrderId;
use domain::OrderNumber;
use store::{Store, UnitOfWorkExt};

use crate::document::{InvoiceDocument, invoice_key};
use crate::error::{InvoiceError, Result};
use crate::render::render_pdf;
use crate::storage::InvoiceStorage;

/// Produces invoice files from committed orders.
pub struct InvoiceGenerator<S, F> {
    store: S,
    storage: F,
}

impl<S, F> InvoiceGenerator<S, F>
where
    S: Store,
    F: InvoiceStorage,
{
    pub fn new(store: S, storage: F) -> Self {
        Self { store, storage }
    }

    pub fn storage(&self) -> &F {
        &self.storage
    }

    /// Renders the invoice for an order and writes it under its key,
    /// replacing any earlier version. Returns the key.
    #[tracing::instrument(skip(self))]
    pub async fn generate(&self, order_id: OrderId) -> Result<String> {
        let details = {
            let mut uow = self.store.begin().await?;
            uow.order_details(order_id)
                .await?
                .ok_or(InvoiceError::OrderNotFound(order_id))?
        };

        let document = InvoiceDocument::build(&details)?;
        let bytes = render_pdf(&document)?;
        let key = document.key();
        self.storage.write(&key, bytes).await?;

        tracing::debug!(%key, pages = document.pages.len(), "invoice written");
        Ok(key)
    }

    /// Returns the stored invoice for an order number.
    ///
    /// A malformed number yields `None` without touching storage.
    #[tracing::instrument(skip(self))]
    pub async fn download(&self, order_number: &str) -> Result<Option<Vec<u8>>> {
        let Ok(number) = OrderNumber::parse(order_number) else {
            return Ok(None);
        };
        self.storage.read(&invoice_key(&number)).await
    }
}
