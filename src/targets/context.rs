//! Render-pass scoped record of target invocations.
//!
//! Uses `tokio::task_local!` so every future polled inside
//! [`run_with_targets`] sees the same [`RenderContext`] without threading it
//! through call sites, while unrelated passes interleaved on the same runtime
//! each see their own.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use indexmap::{IndexMap, map::Entry};
use serde::{Serialize, Serializer, ser::SerializeSeq};
use tokio::task::JoinHandle;

use crate::domain::{Invocation, Props, TargetId, TargetName};

use super::error::TargetError;

tokio::task_local! {
    static ACTIVE: ActivePass;
}

/// Ordered mapping of instance name to the invocation that rendered it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    entries: IndexMap<TargetName, Invocation>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invocation, refusing a name already present.
    pub fn insert(&mut self, id: TargetId, props: Props) -> Result<TargetName, TargetError> {
        let name = props.name();
        match self.entries.entry(name) {
            Entry::Occupied(occupied) => Err(TargetError::DuplicateName {
                name: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                let name = vacant.key().clone();
                vacant.insert(Invocation::new(id, props));
                Ok(name)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Invocation> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order their invocations were entered.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetName, &Invocation)> {
        self.entries.iter()
    }

    /// Encode as `[[name, [id, props]], ...]` in insertion order.
    pub fn to_json(&self) -> Result<String, TargetError> {
        serde_json::to_string(self).map_err(TargetError::from)
    }
}

impl Serialize for RenderContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (name, invocation) in &self.entries {
            seq.serialize_element(&(name, invocation))?;
        }
        seq.end()
    }
}

#[derive(Debug, Default)]
struct PassState {
    context: RenderContext,
    finalized: bool,
}

/// Handle to the pass currently installed in the task-local slot.
#[derive(Debug, Clone, Default)]
struct ActivePass {
    state: Arc<Mutex<PassState>>,
}

impl ActivePass {
    fn lock(&self) -> MutexGuard<'_, PassState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, id: TargetId, props: Props) -> Result<TargetName, TargetError> {
        let mut state = self.lock();
        if state.finalized {
            return Err(TargetError::PassFinalized { name: props.name() });
        }
        state.context.insert(id, props)
    }

    fn snapshot(&self) -> RenderContext {
        self.lock().context.clone()
    }

    fn finalize(&self) -> RenderContext {
        let mut state = self.lock();
        state.finalized = true;
        std::mem::take(&mut state.context)
    }
}

/// Run `body` inside a fresh render pass.
///
/// Returns the body's output together with the finalized context. Once
/// `body` resolves the pass is closed: detached tasks still holding it can no
/// longer record invocations.
pub async fn run_with_targets<F, R>(body: F) -> (R, RenderContext)
where
    F: Future<Output = R>,
{
    let pass = ActivePass::default();
    let output = ACTIVE.scope(pass.clone(), body).await;
    (output, pass.finalize())
}

/// Record an invocation into the active pass.
pub(crate) fn record(id: TargetId, props: Props) -> Result<TargetName, TargetError> {
    ACTIVE
        .try_with(|pass| pass.record(id, props))
        .map_err(|_| TargetError::NoActivePass)?
}

/// Copy of the active pass's entries so far.
pub fn current_context() -> Result<RenderContext, TargetError> {
    ACTIVE
        .try_with(ActivePass::snapshot)
        .map_err(|_| TargetError::NoActivePass)
}

/// Encode the active pass as `[[name, [id, props]], ...]`.
pub fn serialize_target_calls() -> Result<String, TargetError> {
    current_context()?.to_json()
}

/// Whether the calling task is inside a render pass.
pub fn in_render_pass() -> bool {
    ACTIVE.try_with(|_| ()).is_ok()
}

/// Spawn `future` on the tokio runtime as part of the active pass.
///
/// `tokio::spawn` does not carry task-locals over, so targets invoked from a
/// plain spawned task would fail with [`TargetError::NoActivePass`].
pub fn spawn_in_pass<F>(future: F) -> Result<JoinHandle<F::Output>, TargetError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let pass = ACTIVE
        .try_with(Clone::clone)
        .map_err(|_| TargetError::NoActivePass)?;
    Ok(tokio::spawn(ACTIVE.scope(pass, future)))
}
