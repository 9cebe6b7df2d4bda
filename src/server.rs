// src/server.rs
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::ProxyError;
use crate::proxy::PaymasterProxy;
use crate::types::PaymasterRequest;

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) | Self::NotSponsorable => StatusCode::BAD_REQUEST,
            Self::UnsupportedMethod(_) => StatusCode::NOT_FOUND,
            Self::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller. Upstream details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            Self::MalformedRequest(_) | Self::NotSponsorable => self.to_string(),
            Self::UnsupportedMethod(_) => "Method not found".to_string(),
            Self::UpstreamFailure(_) => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        if let Self::UpstreamFailure(e) = &self {
            error!("Error handling request: {}", e);
        }
        (self.status_code(), Json(json!({ "error": self.client_message() }))).into_response()
    }
}

pub fn build_router(route: &str, proxy: Arc<PaymasterProxy>) -> Router {
    Router::new()
        .route(route, post(sponsor))
        .layer(TraceLayer::new_for_http())
        .with_state(proxy)
}

// The body is taken as raw bytes so that bad input still gets the JSON error
// contract instead of the extractor's own rejection.
async fn sponsor(
    State(proxy): State<Arc<PaymasterProxy>>,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let request = PaymasterRequest::from_slice(&body)?;
    let result = proxy.handle(request).await?;
    Ok(Json(json!({ "result": result })))
}

pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn stop(self) -> anyhow::Result<()> {
        // The server may already have exited, in which case the receiver is gone.
        let _ = self.shutdown.send(());
        self.task.await??;
        Ok(())
    }
}

pub async fn start_server(
    server_addr: SocketAddr,
    route: &str,
    proxy: Arc<PaymasterProxy>,
) -> anyhow::Result<ServerHandle> {
    let listener = TcpListener::bind(server_addr).await?;
    let local_addr = listener.local_addr()?;
    let app = build_router(route, proxy);
    let (shutdown, signal) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                signal.await.ok();
            })
            .await
    });

    info!("Paymaster proxy listening on {}{}", local_addr, route);

    Ok(ServerHandle {
        local_addr,
        shutdown,
        task,
    })
}
