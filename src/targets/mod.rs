//! Target runtime: registration, per-pass invocation tracking and the wire
//! formats used to replay renders.

mod context;
mod error;
mod payload;
mod registry;
mod target;

pub use context::{
    RenderContext, current_context, in_render_pass, run_with_targets, serialize_target_calls,
    spawn_in_pass,
};
pub use error::{FragmentError, ParseError, TargetError};
pub use payload::{RevalidationPayload, parse_revalidation_payload};
pub use registry::TargetRegistry;
pub use target::{CONTAINER_TAG, RenderFn, Target, wrap_markup};
