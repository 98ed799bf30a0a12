use askama::{Error as AskamaError, Template};
use axum::{http::StatusCode, response::Html};
use thiserror::Error;

use crate::application::error::HttpError;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

/// Markup of the demo `Header` target.
#[derive(Template)]
#[template(path = "partials/header.html")]
pub struct HeaderTemplate<'a> {
    pub title: &'a str,
    pub user_name: &'a str,
}

/// Page shell; `header` is already-rendered target markup and `targets` the
/// render table of the pass that produced it.
#[derive(Template)]
#[template(path = "document.html")]
pub struct DocumentTemplate<'a> {
    pub title: &'a str,
    pub header: &'a str,
    pub targets: String,
}

impl<'a> DocumentTemplate<'a> {
    pub fn new(title: &'a str, header: &'a str, targets_json: &str) -> Self {
        Self {
            title,
            header,
            targets: script_safe(targets_json),
        }
    }
}

/// Make JSON safe to inline in a `<script>` element. `<` only occurs inside
/// string literals, where `\u003c` decodes to the same character.
fn script_safe(json: &str) -> String {
    json.replace('<', "\\u003c")
}
