use crate::agent::{ ChatAgent, ChatError };
use crate::cli::Args;
use crate::models::chat::{ AIModel, ErrorResponse };
use crate::utils::{ format_bytes, format_time, generate_id };
use chrono::Local;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    routing::{ get, post },
    Router,
    Json,
    extract::State,
    response::{ Html, IntoResponse, Response },
    http::StatusCode,
};
use tower_http::cors::{ Any, CorsLayer };
use log::{ debug, info, warn };

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Clone)]
pub struct AppState {
    agent: Arc<ChatAgent>,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { error: self.user_message().to_string() };
        (self.status(), Json(body)).into_response()
    }
}

pub fn router(agent: Arc<ChatAgent>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/models", get(models_handler))
        .layer(cors)
        .with_state(AppState { agent })
}

pub async fn start_http_server(
    addr: &str,
    agent: Arc<ChatAgent>,
    args: &Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(agent);

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => (cert_path, key_path),
            _ => {
                return Err("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e)
        })?;

        info!("Starting HTTP server on: http://{}", addr);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
            })
            .await?;
    }

    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn models_handler(State(state): State<AppState>) -> Json<Vec<AIModel>> {
    Json(state.agent.available_models())
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = generate_id();
    debug!("[{}] Received chat body of {}", request_id, format_bytes(body.len() as u64, 2));

    match state.agent.respond(&body).await {
        Ok(reply) => {
            info!("[{}] Replied at {}", request_id, format_time(&Local::now()));
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(e) => {
            warn!("[{}] Chat request failed with {}: {}", request_id, e.status(), e);
            e.into_response()
        }
    }
}
