use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    application::{
        demo::{DemoTargets, UserStore},
        error::HttpError,
        revalidate::RevalidationService,
    },
    domain::Props,
    infra::assets::serve_client_script,
    presentation::views::{DocumentTemplate, render_template},
    targets::{RevalidationPayload, run_with_targets},
};

use super::middleware::{RevalidationSummary, log_responses, set_request_context};

/// Request header carrying the JSON revalidation payload.
pub const REVALIDATE_HEADER: &str = "x-revalidate";
pub const DOCUMENT_TITLE: &str = "Targets Example";
/// Instance name of the header target on the demo page.
pub const HEADER_INSTANCE: &str = "header";

#[derive(Clone)]
pub struct HttpState {
    pub demo: DemoTargets,
    pub store: Arc<UserStore>,
    pub revalidation: RevalidationService,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/update-name", post(update_name))
        .route("/app.js", get(serve_client_script))
        .route("/_health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index(State(state): State<HttpState>) -> Response {
    match render_document(&state).await {
        Ok(html) => (StatusCode::OK, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Render the demo page in one pass and embed that pass's render table.
pub async fn render_document(state: &HttpState) -> Result<Html<String>, HttpError> {
    let header = state.demo.header.clone();
    let (markup, context) = run_with_targets(async move {
        header
            .call(Props::named(HEADER_INSTANCE).with("title", DOCUMENT_TITLE))
            .await
    })
    .await;

    let markup = markup?;
    let targets = context.to_json()?;
    render_template(DocumentTemplate::new(DOCUMENT_TITLE, &markup, &targets))
}

#[derive(Debug, Deserialize)]
struct UpdateNameForm {
    name: String,
}

async fn update_name(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Form(form): Form<UpdateNameForm>,
) -> Response {
    let payload = match revalidation_payload(&headers) {
        Ok(payload) => payload,
        Err(err) => return err.into_response(),
    };

    let name = form.name.trim();
    if name.is_empty() {
        return HttpError::new(
            "infra::http::update_name",
            StatusCode::BAD_REQUEST,
            "Name must not be empty",
            "form field `name` is empty",
        )
        .into_response();
    }

    let requested = payload.len();
    let mut response = match state.revalidation.ensure_known(&payload) {
        Ok(()) => {
            state.store.set_user_name(name);
            info!(requested, "user name updated");
            match state.revalidation.revalidate(payload).await {
                Ok(rendered) => Json(rendered).into_response(),
                Err(err) => HttpError::from(err).into_response(),
            }
        }
        Err(err) => HttpError::from(err).into_response(),
    };
    response
        .extensions_mut()
        .insert(RevalidationSummary { requested });
    response
}

fn revalidation_payload(headers: &HeaderMap) -> Result<RevalidationPayload, HttpError> {
    const SOURCE: &str = "infra::http::revalidation_payload";

    let value = headers.get(REVALIDATE_HEADER).ok_or_else(|| {
        HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Missing revalidation header",
            format!("request has no `{REVALIDATE_HEADER}` header"),
        )
    })?;
    let text = value.to_str().map_err(|err| {
        HttpError::from_error(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Invalid revalidation payload",
            &err,
        )
    })?;

    Ok(RevalidationPayload::parse(text)?)
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
