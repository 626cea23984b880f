use std::sync::Arc;

use async_trait::async_trait;

use crate::{RequestInfo, ResponseSink};

/// Something that produces a response for a request.
///
/// Middlewares implement this trait too and wrap another handler, so a
/// whole chain is itself a `Handler`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()>;
}

#[async_trait]
impl<H> Handler for Arc<H>
where
    H: Handler + ?Sized,
{
    async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
        (**self).serve(req, sink).await
    }
}
