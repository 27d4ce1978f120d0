use crate::request::BodyPrintLimit;
use crate::router::Router;
use crate::{Request, ResponseTemplate};
use http::StatusCode;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use log::{debug, log_enabled, warn, Level};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The actual HTTP server answering incoming requests with the installed fixtures.
///
/// It returns once `shutdown_signal` fires, after the listener has been closed and every open
/// connection has been wound down.
pub(super) async fn run_server(
    listener: TcpListener,
    router: Arc<Router>,
    body_print_limit: BodyPrintLimit,
    mut shutdown_signal: tokio::sync::oneshot::Receiver<()>,
) {
    let server = auto::Builder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Failed to accept a connection: {}", e);
                        continue;
                    }
                };
                let router = router.clone();
                let service = service_fn(move |request: hyper::Request<Incoming>| {
                    let router = router.clone();
                    async move {
                        Ok::<_, Infallible>(handle_request(&router, request, body_print_limit).await)
                    }
                });
                let connection = server.serve_connection_with_upgrades(TokioIo::new(stream), service);
                let connection = graceful.watch(connection.into_owned());
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        debug!("Connection from {} terminated with an error: {}", peer, e);
                    }
                });
            }
            // Resolves when the trigger is used or dropped along with its `FixedServer`.
            _ = &mut shutdown_signal => break,
        }
    }

    // Release the port before waiting on connections.
    drop(listener);
    graceful.shutdown().await;
}

async fn handle_request(
    router: &Router,
    request: hyper::Request<Incoming>,
    body_print_limit: BodyPrintLimit,
) -> hyper::Response<Full<Bytes>> {
    let mut request = match Request::from_hyper(request).await {
        Ok(request) => request,
        Err(e) => {
            warn!("Failed to read an incoming request: {}", e);
            return ResponseTemplate::new(StatusCode::BAD_REQUEST).generate_response();
        }
    };

    match router.dispatch(&mut request) {
        Some(response) => {
            // Sleeping here only stalls this connection, other requests keep flowing.
            if let Some(delay) = response.delay() {
                tokio::time::sleep(delay).await;
            }
            response.generate_response()
        }
        None => {
            if log_enabled!(Level::Debug) {
                let mut printed = String::new();
                if request.print_with_limit(&mut printed, body_print_limit).is_ok() {
                    debug!("No fixture matched the incoming request:\n{}", printed);
                }
            }
            ResponseTemplate::new(StatusCode::NOT_FOUND).generate_response()
        }
    }
}
