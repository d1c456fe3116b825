use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::config::KioskConfig;
use crate::error::TransportError;
use crate::submission::{SubmissionRecord, SubmissionStatus};

/// Outbound boundary for finished submissions. One call per submission,
/// no retry, no timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), TransportError>;
}

/// A stamped record bound to its transport, detached from the controller so
/// the network call can run on its own task.
pub struct Delivery {
    session: Uuid,
    record: SubmissionRecord,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("session", &self.session)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Delivery {
    pub fn new(session: Uuid, record: SubmissionRecord, transport: Arc<dyn Transport>) -> Self {
        Self {
            session,
            record,
            transport,
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn status(&self) -> SubmissionStatus {
        self.record.payload.status
    }

    pub fn record(&self) -> &SubmissionRecord {
        &self.record
    }

    pub async fn send(self) -> DeliveryReport {
        let result = self.transport.deliver(&self.record).await;
        DeliveryReport {
            session: self.session,
            status: self.record.payload.status,
            result,
        }
    }
}

/// Outcome of one [`Delivery`], handed back to the controller.
#[derive(Debug)]
pub struct DeliveryReport {
    pub session: Uuid,
    pub status: SubmissionStatus,
    pub result: Result<(), TransportError>,
}

/// Picks the HTTP transport when an endpoint is configured and the logging
/// transport otherwise.
pub fn transport_for(config: &KioskConfig) -> Result<Arc<dyn Transport>, TransportError> {
    match &config.endpoint {
        Some(endpoint) => Ok(Arc::new(HttpTransport::new(endpoint.clone(), &config.client_id)?)),
        None => Ok(Arc::new(LogTransport)),
    }
}

/// POSTs `[record]` as JSON; any non-2xx status is a failure.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url, client_id: &str) -> Result<Self, TransportError> {
        let client = Client::builder().user_agent(client_id).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&[record])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Dry-run transport: writes the body to the log and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), TransportError> {
        let body = serde_json::to_string(&[record])?;
        info!(status = record.payload.status.as_str(), %body, "dry-run submission");
        Ok(())
    }
}

/// Keeps every delivered record in memory. Can be switched to fail.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    delivered: Mutex<Vec<SubmissionRecord>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.set_failing(true);
        transport
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<SubmissionRecord> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Status(503));
        }
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}
