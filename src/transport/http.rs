//! Synchronous HTTP surface: `POST /hook?inputType=...`.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{bearer_token, status_code};
use crate::dispatch::{DispatchOutcome, DispatchRequest, Dispatcher};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HookQuery {
    input_type: Option<String>,
    output_type: Option<String>,
    token: Option<String>,
    url: Option<String>,
}

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/hook", post(hook))
        .route("/hook/", post(hook))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

pub async fn serve(addr: &str, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}

async fn home(State(dispatcher): State<Arc<Dispatcher>>) -> String {
    let registry = dispatcher.registry();
    format!(
        "chathooks\n\nPOST /hook?inputType=<input>&url=<webhook url>\n\ninput types: {}\noutput types: {}\n",
        registry.source_keys().join(", "),
        registry.adapter_keys().join(", ")
    )
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn extract_request(query: HookQuery, headers: &HeaderMap, body: Bytes) -> DispatchRequest {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    DispatchRequest {
        input_type: header(headers, "inputtype").or(query.input_type),
        output_type: header(headers, "outputtype").or(query.output_type),
        token: header(headers, "token").or(bearer).or(query.token),
        url: query.url,
        body: body.to_vec(),
    }
}

async fn hook(
    State(dispatcher): State<Arc<Dispatcher>>,
    query: Result<Query<HookQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<DispatchOutcome>) {
    let outcome = match query {
        Ok(Query(query)) => {
            dispatcher
                .dispatch(extract_request(query, &headers, body))
                .await
        }
        Err(rejection) => {
            let reason = format!("invalid query string: {}", rejection.body_text());
            warn!(reason = %reason, "Webhook rejected");
            DispatchOutcome::Rejected { code: 400, reason }
        }
    };
    let status =
        StatusCode::from_u16(status_code(&outcome)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome))
}
