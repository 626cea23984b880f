use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use weatherhk_http::{Handler, RequestInfo, ResponseSink, responses};

/// Exact-path dispatch. Unknown paths get a 404.
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `handler` at `path`; a later route on the same path replaces
    /// the earlier one.
    pub fn route(mut self, path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.routes.insert(path.into(), Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl Handler for Router {
    async fn serve(&self, req: &RequestInfo, sink: &mut dyn ResponseSink) -> anyhow::Result<()> {
        match self.routes.get(req.path()) {
            Some(handler) => handler.serve(req, sink).await,
            None => {
                debug!(target: "weatherhk::server", path = %req.path(), "No route matched");
                responses::send_404(sink)?;
                Ok(())
            }
        }
    }
}
