//! Background invoice jobs.

use std::sync::Arc;
use std::time::Instant;

use common::OrderId;
use store::Store;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::generator::InvoiceGenerator;
use crate::storage::InvoiceStorage;

/// Queues invoice jobs for a background worker.
///
/// Cloning shares the queue. The worker exits once every clone is dropped
/// and the queue is drained.
#[derive(Debug, Clone)]
pub struct InvoiceDispatcher {
    sender: mpsc::UnboundedSender<OrderId>,
}

impl InvoiceDispatcher {
    /// Starts the worker on the current runtime.
    pub fn spawn<S, F>(generator: Arc<InvoiceGenerator<S, F>>) -> (Self, JoinHandle<()>)
    where
        S: Store + 'static,
        F: InvoiceStorage + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(generator, receiver));
        (Self { sender }, handle)
    }

    /// Queues an invoice job. Never fails the caller.
    pub fn enqueue(&self, order_id: OrderId) {
        if self.sender.send(order_id).is_err() {
            tracing::warn!(%order_id, "invoice worker stopped, job dropped");
            metrics::counter!("invoices_failed_total").increment(1);
        } else {
            metrics::gauge!("invoice_queue_depth").increment(1.0);
        }
    }
}

async fn run_worker<S, F>(
    generator: Arc<InvoiceGenerator<S, F>>,
    mut receiver: mpsc::UnboundedReceiver<OrderId>,
) where
    S: Store,
    F: InvoiceStorage,
{
    while let Some(order_id) = receiver.recv().await {
        metrics::gauge!("invoice_queue_depth").decrement(1.0);
        let start = Instant::now();

        match generator.generate(order_id).await {
            Ok(key) => {
                metrics::counter!("invoices_generated_total").increment(1);
                metrics::histogram!("invoice_generation_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(%order_id, %key, "invoice generated");
            }
            Err(e) => {
                metrics::counter!("invoices_failed_total").increment(1);
                tracing::warn!(%order_id, error = %e, "invoice generation failed");
            }
        }
    }
    tracing::debug!("invoice worker stopped");
}
