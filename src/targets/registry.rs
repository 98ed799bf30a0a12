//! Process-wide table of registered targets.
//!
//! Populated while fragment modules are loaded and read by every render pass.
//! The registry is an owned value shared through application state so tests
//! and independent server instances each get their own.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use tracing::debug;

use crate::domain::TargetId;

use super::{
    error::TargetError,
    target::{RenderFn, Target},
};

/// Maps [`TargetId`] to the wrapped render function.
#[derive(Default)]
pub struct TargetRegistry {
    targets: RwLock<HashMap<TargetId, Target>>,
}

impl TargetRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `render` under `id` and store it, replacing any earlier entry.
    ///
    /// Re-registration happens when a module is reloaded; the newest
    /// function wins.
    pub fn register(&self, id: TargetId, render: impl RenderFn) -> Target {
        let target = Target::new(id.clone(), render);
        let previous = self
            .targets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), target.clone());
        if previous.is_some() {
            debug!(target_id = %id, "target re-registered");
        } else {
            debug!(target_id = %id, "target registered");
        }
        target
    }

    /// Look up a target; `None` when the id was never registered.
    pub fn lookup(&self, id: &TargetId) -> Option<Target> {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Like [`lookup`](Self::lookup), reporting a miss as [`TargetError::UnknownTarget`].
    pub fn get(&self, id: &TargetId) -> Result<Target, TargetError> {
        self.lookup(id)
            .ok_or_else(|| TargetError::UnknownTarget { id: id.clone() })
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<TargetId> {
        let mut ids: Vec<_> = self
            .targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::Props,
        targets::{FragmentError, run_with_targets},
    };

    fn constant(text: &'static str) -> impl RenderFn {
        move |_props: Props| async move { Ok::<_, FragmentError>(text.to_string()) }
    }

    #[test]
    fn register_and_lookup() {
        let registry = TargetRegistry::new();
        let id = TargetId::new("target-type-id-1");

        registry.register(id.clone(), constant("one"));

        assert!(registry.lookup(&id).is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ids(), vec![id]);
    }

    #[test]
    fn unknown_id_is_reported_not_invoked() {
        let registry = TargetRegistry::new();
        let missing = TargetId::new("missing");

        assert!(registry.lookup(&missing).is_none());
        assert!(matches!(
            registry.get(&missing),
            Err(TargetError::UnknownTarget { id }) if id == missing
        ));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let registry = TargetRegistry::new();
        let id = TargetId::new("hot");

        registry.register(id.clone(), constant("old"));
        registry.register(id.clone(), constant("new"));

        let target = registry.get(&id).expect("registered");
        let (markup, _) =
            run_with_targets(async { target.call(Props::named("n")).await }).await;
        assert_eq!(
            markup.expect("render"),
            r#"<x-target type="hot" name="n">new</x-target>"#
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registries_are_independent() {
        let first = TargetRegistry::new();
        let second = TargetRegistry::new();
        first.register(TargetId::new("only-first"), constant("x"));

        assert!(second.lookup(&TargetId::new("only-first")).is_none());
    }
}
