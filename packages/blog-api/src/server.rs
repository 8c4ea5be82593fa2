//! Hyper server setup and request handling.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming as IncomingBody};
use hyper::{Request, Response};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::router::Router;

/// HTTP server for the blog API.
pub struct Server {
    addr: SocketAddr,
    router: Router,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to
    /// * `router` - Request router
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self { addr, router }
    }

    /// Serves until the process exits.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Binds the configured address and serves until `shutdown` completes.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr).await?;
        Self::serve_with_listener(listener, self.router, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` completes.
    ///
    /// On shutdown the listener is closed, open connections finish their
    /// in-flight requests, and the router is dropped before returning.
    pub async fn serve_with_listener<F>(
        listener: TcpListener,
        router: Router,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()>,
    {
        let router = Arc::new(router);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };
                    tracing::trace!("Accepted connection from {}", peer);
                    connections.spawn(serve_connection(
                        TokioIo::new(stream),
                        Arc::clone(&router),
                        stop_rx.clone(),
                    ));
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        drop(listener);
        tracing::info!(
            "Shutting down server, waiting for {} open connections",
            connections.len()
        );
        let _ = stop_tx.send(true);
        while connections.join_next().await.is_some() {}

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Serves one connection, finishing in-flight requests once `stop` flips.
async fn serve_connection(
    io: TokioIo<tokio::net::TcpStream>,
    router: Arc<Router>,
    mut stop: watch::Receiver<bool>,
) {
    let builder = ConnectionBuilder::new(TokioExecutor::new());
    let service =
        hyper::service::service_fn(move |req| handle_request(req, Arc::clone(&router)));
    let conn = builder.serve_connection(io, service);
    tokio::pin!(conn);

    let mut stopping = false;
    loop {
        tokio::select! {
            res = conn.as_mut() => {
                if let Err(err) = res {
                    tracing::debug!("Error serving connection: {}", err);
                }
                break;
            }
            _ = stop.changed(), if !stopping => {
                stopping = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

/// Handles an incoming HTTP request.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(router.route(req).await.map(Full::new))
}
