use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::TargetError;

/// Incremental response body produced by a target.
pub type ResponseStream = BoxStream<'static, Result<Bytes, TargetError>>;

/// The system under test.
///
/// A target accepts one request payload and answers with a stream of
/// partial output. The request succeeds once the stream ends without an
/// error item; an empty stream is a success with no response body.
#[async_trait]
pub trait LoadTarget: Send + Sync {
    /// Submits a single request.
    async fn submit(&self, payload: &serde_json::Value) -> Result<ResponseStream, TargetError>;
}
