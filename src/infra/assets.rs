//! Embedded client script.

use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};

/// Client script that posts revalidation requests and splices the results in.
pub const CLIENT_SCRIPT: &str = include_str!("../../static/app.js");

pub async fn serve_client_script() -> Response {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/javascript; charset=utf-8"),
        )],
        CLIENT_SCRIPT,
    )
        .into_response()
}
