use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{Level, event, info};
use uuid::Uuid;

use crate::application::error::ErrorReport;

/// Response header echoing the id assigned to the request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const LOG_TARGET: &str = "retarget::http::response";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Attached by handlers that drive a revalidation pass.
#[derive(Debug, Clone, Copy)]
pub struct RevalidationSummary {
    pub requested: usize,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// Log revalidations and every failed response with its [`ErrorReport`].
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let line = ResponseLine {
        status: response.status(),
        method,
        path,
        request_id,
        elapsed_ms: start.elapsed().as_millis(),
        requested: response
            .extensions()
            .get::<RevalidationSummary>()
            .map(|summary| summary.requested),
    };

    if line.status.is_client_error() || line.status.is_server_error() {
        let report = response.extensions_mut().remove::<ErrorReport>();
        line.failed(report);
    } else if let Some(requested) = line.requested {
        info!(
            target: LOG_TARGET,
            status = line.status.as_u16(),
            path = %line.path,
            requested,
            elapsed_ms = line.elapsed_ms,
            request_id = %line.request_id,
            "targets revalidated",
        );
    }

    response
}

struct ResponseLine {
    status: StatusCode,
    method: Method,
    path: String,
    request_id: String,
    elapsed_ms: u128,
    requested: Option<usize>,
}

impl ResponseLine {
    fn failed(&self, report: Option<ErrorReport>) {
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .map(String::as_str)
            .unwrap_or("no diagnostic available");

        macro_rules! failure {
            ($level:expr, $message:literal) => {
                event!(
                    target: LOG_TARGET,
                    $level,
                    status = self.status.as_u16(),
                    method = %self.method,
                    path = %self.path,
                    elapsed_ms = self.elapsed_ms,
                    source,
                    detail,
                    chain = ?messages,
                    requested = ?self.requested,
                    request_id = %self.request_id,
                    $message,
                )
            };
        }

        if self.status.is_server_error() {
            failure!(Level::ERROR, "request failed");
        } else {
            failure!(Level::WARN, "client request error");
        }
    }
}
