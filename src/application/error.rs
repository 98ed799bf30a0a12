use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    infra::error::InfraError,
    targets::{ParseError, TargetError},
    transform::TransformError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<TargetError> for HttpError {
    fn from(error: TargetError) -> Self {
        const SOURCE: &str = "application::error::target_error_to_http_error";
        let (status, public_message) = match &error {
            TargetError::UnknownTarget { .. } => (StatusCode::NOT_FOUND, "Unknown target"),
            TargetError::DuplicateName { .. } => {
                (StatusCode::CONFLICT, "Duplicate target name in request")
            }
            TargetError::TimedOut => (StatusCode::GATEWAY_TIMEOUT, "Render timed out"),
            TargetError::NoActivePass
            | TargetError::PassFinalized { .. }
            | TargetError::Render { .. }
            | TargetError::Encode(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        HttpError::from_error(SOURCE, status, public_message, &error)
    }
}

impl From<ParseError> for HttpError {
    fn from(error: ParseError) -> Self {
        HttpError::from_error(
            "application::error::parse_error_to_http_error",
            StatusCode::BAD_REQUEST,
            "Invalid revalidation payload",
            &error,
        )
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TargetId, TargetName};

    #[test]
    fn target_errors_map_to_statuses() {
        let cases = [
            (
                TargetError::UnknownTarget {
                    id: TargetId::new("x"),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                TargetError::DuplicateName {
                    name: TargetName::from("a"),
                },
                StatusCode::CONFLICT,
            ),
            (TargetError::TimedOut, StatusCode::GATEWAY_TIMEOUT),
            (TargetError::NoActivePass, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(HttpError::from(error).status(), status);
        }
    }

    #[test]
    fn report_collects_source_chain() {
        let error = TargetError::Render {
            id: TargetId::new("t"),
            name: TargetName::from("n"),
            source: Box::new(std::io::Error::other("backend down")),
        };
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &error);
        assert_eq!(
            report.messages,
            vec![
                "target `t` failed to render instance `n`".to_string(),
                "backend down".to_string()
            ]
        );
    }
}
