use crate::adapters::push::fcm::{FcmBatchParser, FcmBatchResponse, FcmResponse};
use crate::adapters::push::{HttpResponse, PushTransport, ResponseParser, ensure_unique};
use crate::config::DispatchConfig;
use crate::diagnostics::DiagnosticLogger;
use crate::domain::payload::FcmPayload;
use crate::domain::report::StatusSource;
use crate::error::Result;
use futures::future::join_all;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

const PROVIDER: &str = "fcm";

#[derive(Clone, Debug)]
struct Metrics {
    statuses: Counter<u64>,
    batches: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("push-delivery");
        Self {
            statuses: meter
                .u64_counter("push_delivery_status_total")
                .with_description("Endpoints processed, by provider and resulting delivery status")
                .build(),
            batches: meter
                .u64_counter("push_delivery_batches_total")
                .with_description("Sub-batches sent and merged")
                .build(),
        }
    }
}

/// Sends one FCM payload to many tokens in sub-batches and folds the results together.
#[derive(Debug)]
pub struct BatchDispatcher {
    transport: Arc<dyn PushTransport>,
    logger: Arc<dyn DiagnosticLogger>,
    batch_size: usize,
    semaphore: Arc<Semaphore>,
    metrics: Metrics,
}

impl BatchDispatcher {
    #[must_use]
    pub fn new(
        transport: Arc<dyn PushTransport>,
        logger: Arc<dyn DiagnosticLogger>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            transport,
            logger,
            batch_size: config.batch_size.max(1),
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
            metrics: Metrics::new(),
        }
    }

    /// Sends `payload` to every endpoint and returns the cumulative statuses.
    ///
    /// Chunks are merged in list order, so an endpoint listed in several chunks
    /// ends with the status from the last one.
    ///
    /// # Errors
    /// Returns a `DeliveryError` if a chunk names the same endpoint twice. Chunks
    /// are checked before anything is sent.
    #[tracing::instrument(skip_all, fields(endpoints = endpoints.len(), batch_size = self.batch_size))]
    pub async fn dispatch(&self, payload: &FcmPayload, endpoints: &[String]) -> Result<FcmResponse> {
        for chunk in endpoints.chunks(self.batch_size) {
            ensure_unique(chunk)?;
        }

        let mut cumulative = FcmResponse::new();

        for (index, chunk) in endpoints.chunks(self.batch_size).enumerate() {
            let raw = self.send_chunk(payload, chunk).await;
            let batch = FcmBatchParser.parse(&raw, chunk, self.logger.as_ref())?;

            self.record(&batch, chunk);
            cumulative.add_batch_response(&batch, chunk);
            tracing::debug!(batch = index, size = chunk.len(), "Merged FCM sub-batch");
        }

        Ok(cumulative)
    }

    async fn send_chunk(&self, payload: &FcmPayload, chunk: &[String]) -> HashMap<String, HttpResponse> {
        let sends = chunk.iter().map(|endpoint| async move {
            // The semaphore is never closed, so a failed acquire only drops the bound.
            let _permit = self.semaphore.acquire().await.ok();
            let body = payload.for_token(endpoint);
            let response = self.transport.send(endpoint, &body).await;
            (endpoint.clone(), response)
        });

        join_all(sends).await.into_iter().collect()
    }

    fn record(&self, batch: &FcmBatchResponse, chunk: &[String]) {
        self.metrics.batches.add(1, &[KeyValue::new("provider", PROVIDER)]);
        for endpoint in chunk {
            let status = batch.get_status(endpoint);
            self.metrics
                .statuses
                .add(1, &[KeyValue::new("provider", PROVIDER), KeyValue::new("status", status.as_str())]);
        }
    }
}
