//! HTTP listener.
//!
//! Uses hyper http1 with TokioIo. Each request body is read up to the
//! configured limit, turned into an [`ApiRequest`] and handed to
//! [`TodoServer::handle`] on the blocking pool (password hashing is
//! CPU-bound).

use crate::error::{ServerError, ServerResult};
use crate::server::TodoServer;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::io::ErrorKind;
use std::sync::Arc;
use todosync_protocol::{ApiRequest, ApiResponse, EndpointConfig, Method};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Binds the first free candidate port.
///
/// Candidates are tried in declared order. Only `AddrInUse` moves on to the
/// next one; any other bind error is returned as is.
pub async fn bind(endpoint: &EndpointConfig) -> ServerResult<TcpListener> {
    let candidates = endpoint.candidates();
    for port in &candidates {
        match TcpListener::bind((endpoint.host.as_str(), *port)).await {
            Ok(listener) => {
                info!("listening on {}", listener.local_addr()?);
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                warn!("port {port} is already in use, trying the next candidate");
            }
            Err(e) => return Err(e.into()),
        }
    }
    error!("could not find an available port");
    Err(ServerError::NoAvailablePort {
        tried: candidates.len(),
    })
}

/// Serves until the process ends.
pub async fn serve(server: Arc<TodoServer>, listener: TcpListener) -> ServerResult<()> {
    serve_with_shutdown(server, listener, std::future::pending()).await
}

/// Serves until `shutdown` resolves. In-flight connections are left to
/// finish on their own tasks.
pub async fn serve_with_shutdown<F>(
    server: Arc<TodoServer>,
    listener: TcpListener,
    shutdown: F,
) -> ServerResult<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down listener");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let server = Arc::clone(&server);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let server = Arc::clone(&server);
                            async move { Ok::<_, Infallible>(respond(server, req).await) }
                        });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("error serving connection from {addr}: {err:?}");
                        }
                    });
                }
                Err(e) => {
                    error!("error accepting connection: {e:?}");
                }
            }
        }
    }
}

async fn respond(server: Arc<TodoServer>, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let method = match req.method().as_str().parse::<Method>() {
        Ok(method) => method,
        Err(message) => return to_http(ApiResponse::error(405, message)),
    };
    let path = req.uri().path().to_string();
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(ApiRequest::bearer_from_header);

    let limit = server.config().max_body_bytes;
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            debug!("rejecting body for {path}: {e}");
            return to_http(ApiResponse::error(400, "request body too large or unreadable"));
        }
    };

    let request = ApiRequest {
        method,
        path,
        bearer,
        body,
    };
    let response = tokio::task::spawn_blocking(move || server.handle(&request)).await;
    match response {
        Ok(response) => to_http(response),
        Err(e) => {
            error!("request handler panicked: {e}");
            to_http(ApiResponse::error(500, "server error"))
        }
    }
}

fn to_http(response: ApiResponse) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = Response::new(Full::new(Bytes::from(response.body)));
    *http.status_mut() = status;
    http.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    http
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn falls_back_when_default_port_is_taken() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let taken = occupied.local_addr().unwrap().port();

        let endpoint = EndpointConfig::new("127.0.0.1", taken).with_fallback_ports([0]);
        let listener = bind(&endpoint).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), taken);
    }

    #[tokio::test]
    async fn gives_up_after_the_candidates() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let taken = occupied.local_addr().unwrap().port();

        let endpoint = EndpointConfig::new("127.0.0.1", taken).with_fallback_ports([taken]);
        let err = bind(&endpoint).await.unwrap_err();
        assert!(matches!(err, ServerError::NoAvailablePort { tried: 1 }));
    }

    #[tokio::test]
    async fn answers_liveness_over_tcp() {
        let server = Arc::new(TodoServer::new(ServerConfig::default()).unwrap());
        let listener = bind(&EndpointConfig::new("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(serve_with_shutdown(server, listener, async move {
            let _ = stopped.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200"));
        assert!(raw.contains("API is running..."));

        stop.send(()).unwrap();
        task.await.unwrap().unwrap();
    }
}
