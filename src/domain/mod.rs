//! Domain layer types and invariants.

pub mod error;
pub mod invocation;
pub mod props;
pub mod target_id;

pub use error::DomainError;
pub use invocation::Invocation;
pub use props::{Props, TargetName};
pub use target_id::TargetId;
