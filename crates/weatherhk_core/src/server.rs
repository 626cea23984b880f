use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, instrument};
use weatherhk_config::ServerConfig;
use weatherhk_http::{Handler, RequestInfo, ResponseWriter, responses};

/// Listener plus accept loop feeding every request through `app`.
pub struct Server {
    cfg: ServerConfig,
    app: Arc<dyn Handler>,
}

impl Server {
    pub fn new(cfg: ServerConfig, app: Arc<dyn Handler>) -> Self {
        Self { cfg, app }
    }

    #[instrument(skip(self), fields(
        listen = %self.cfg.listen_addr(),
        max_connections = self.cfg.max_connections(),
    ))]
    pub async fn run(self) -> anyhow::Result<()> {
        let listen_addr = self.cfg.listen_addr();

        let listener = match TcpListener::bind(&listen_addr).await {
            Ok(l) => {
                info!(target: "weatherhk::server", listen = %listen_addr, "listen at {}", listen_addr);
                l
            }
            Err(e) => {
                error!(
                    target: "weatherhk::server",
                    listen = %listen_addr,
                    error = ?e,
                    "Failed to bind listener"
                );
                return Err(e.into());
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.cfg.max_connections()));
        accept_loop(listener, semaphore, self.app).await
    }
}

async fn accept_loop(
    listener: TcpListener,
    semaphore: Arc<Semaphore>,
    app: Arc<dyn Handler>,
) -> anyhow::Result<()> {
    loop {
        let (stream, client_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(target: "weatherhk::server", error = ?e, "Failed to accept connection");
                return Err(e.into());
            }
        };

        // Owned permits move into the connection task
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("connection semaphore closed")?;

        debug!(
            target: "weatherhk::server",
            client_addr = %client_addr,
            available = semaphore.available_permits(),
            "New connection accepted"
        );

        let app = app.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, client_addr, app).await {
                debug!(
                    target: "weatherhk::server",
                    client_addr = %client_addr,
                    error = ?e,
                    "Connection ended with error"
                );
            }
            drop(permit);
        });
    }
}

async fn serve_connection(
    stream: TcpStream,
    client_addr: SocketAddr,
    app: Arc<dyn Handler>,
) -> anyhow::Result<()> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let app = app.clone();
        async move { Ok::<_, Infallible>(handle_request(req, app.as_ref()).await) }
    });

    http1::Builder::new()
        .serve_connection(io, service)
        .await
        .with_context(|| format!("HTTP/1 connection error ({client_addr})"))?;

    Ok(())
}

/// Runs one request through `app` inside its request span. The request body
/// is never read. A handler error becomes a 500.
pub async fn handle_request<B>(req: Request<B>, app: &dyn Handler) -> Response<Full<Bytes>> {
    let (parts, _body) = req.into_parts();
    let info = RequestInfo::from_parts(&parts);

    let span = tracing::info_span!(
        "request",
        method = %info.method,
        path = %info.path,
        request_id = tracing::field::Empty,
    );

    let mut writer = ResponseWriter::new();
    let result = app.serve(&info, &mut writer).instrument(span.clone()).await;

    if let Err(e) = result {
        span.in_scope(|| {
            error!(target: "weatherhk::server", error = %e, "Handler failed");
        });
        writer = ResponseWriter::new();
        // writing to an in-memory sink cannot fail
        let _ = responses::send_500(&mut writer);
    }

    writer.into_response()
}
