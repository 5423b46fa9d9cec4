use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::error::TransportError;

/// Raw network access to the document store.
///
/// Implementations may be slow; callers bound them with retries and a
/// circuit breaker. Dropping the returned future cancels the request.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_bytes(&self, document_id: &str) -> Result<Bytes, TransportError>;
}

pub type SharedTransport = Arc<dyn Transport>;

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch_bytes(&self, document_id: &str) -> Result<Bytes, TransportError> {
        (**self).fetch_bytes(document_id).await
    }
}
