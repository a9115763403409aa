//! Function-invocation surface.
//!
//! Events use the API-gateway proxy shape common to serverless runtimes:
//! parameters arrive in a `queryStringParameters` map, the body is a string
//! that may be base64 encoded, and the result is a `{statusCode, headers,
//! body}` object.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::{bearer_token, status_code};
use crate::dispatch::{DispatchOutcome, DispatchRequest, Dispatcher};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationEvent {
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Exact key first, then a case-insensitive match; gateways differ in how
/// they case keys. Among several case-insensitive matches the smallest key
/// wins so the result never depends on map order.
fn lookup(map: Option<&HashMap<String, String>>, name: &str) -> Option<String> {
    let map = map?;
    map.get(name)
        .or_else(|| {
            map.iter()
                .filter(|(key, _)| key.eq_ignore_ascii_case(name))
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, value)| value)
        })
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn extract_request(event: InvocationEvent) -> Result<DispatchRequest, String> {
    let params = event.query_string_parameters.as_ref();
    let headers = event.headers.as_ref();

    let body = match event.body {
        None => Vec::new(),
        Some(body) if event.is_base64_encoded => STANDARD
            .decode(body.trim())
            .map_err(|e| format!("body is not valid base64: {e}"))?,
        Some(body) => body.into_bytes(),
    };

    let bearer = lookup(headers, "authorization")
        .as_deref()
        .and_then(bearer_token)
        .map(str::to_string);

    Ok(DispatchRequest {
        input_type: lookup(params, "inputType").or_else(|| lookup(headers, "inputType")),
        output_type: lookup(params, "outputType").or_else(|| lookup(headers, "outputType")),
        token: lookup(params, "token")
            .or_else(|| lookup(headers, "token"))
            .or(bearer),
        url: lookup(params, "url"),
        body,
    })
}

fn respond(outcome: &DispatchOutcome) -> InvocationResponse {
    let headers = [("Content-Type".to_string(), "application/json".to_string())]
        .into_iter()
        .collect();

    InvocationResponse {
        status_code: status_code(outcome),
        headers,
        body: serde_json::to_string(outcome).unwrap_or_default(),
    }
}

pub async fn handle_event(dispatcher: &Dispatcher, event: InvocationEvent) -> InvocationResponse {
    let outcome = match extract_request(event) {
        Ok(request) => dispatcher.dispatch(request).await,
        Err(reason) => DispatchOutcome::Rejected { code: 400, reason },
    };
    respond(&outcome)
}
