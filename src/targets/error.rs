use thiserror::Error;

use crate::domain::{TargetId, TargetName};

/// Boxed error produced by a fragment's own render function.
pub type FragmentError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("target invoked outside of a render pass")]
    NoActivePass,
    #[error("render pass already finalized; late invocation of `{name}` rejected")]
    PassFinalized { name: TargetName },
    #[error("target name `{name}` already rendered in this pass")]
    DuplicateName { name: TargetName },
    #[error("unknown target `{id}`")]
    UnknownTarget { id: TargetId },
    #[error("target `{id}` failed to render instance `{name}`")]
    Render {
        id: TargetId,
        name: TargetName,
        #[source]
        source: FragmentError,
    },
    #[error("render pass timed out")]
    TimedOut,
    #[error("failed to encode render context: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Malformed revalidation payload. Nothing is applied when this is returned.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("revalidation payload is not valid: {0}")]
    Json(#[source] serde_json::Error),
}
