use serde::{Deserialize, Serialize};

use super::{props::Props, target_id::TargetId};

/// Everything needed to reproduce one target render from the registry alone.
///
/// On the wire an invocation is the two-element array `[id, props]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(TargetId, Props)", into = "(TargetId, Props)")]
pub struct Invocation {
    pub id: TargetId,
    pub props: Props,
}

impl Invocation {
    pub fn new(id: TargetId, props: Props) -> Self {
        Self { id, props }
    }
}

impl From<(TargetId, Props)> for Invocation {
    fn from((id, props): (TargetId, Props)) -> Self {
        Self { id, props }
    }
}

impl From<Invocation> for (TargetId, Props) {
    fn from(invocation: Invocation) -> Self {
        (invocation.id, invocation.props)
    }
}
