//! Demo fragments served by the bundled HTTP surface.

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use askama::Template;

use crate::{
    domain::{Props, TargetId},
    presentation::views::HeaderTemplate,
    targets::{FragmentError, Target, TargetRegistry},
};

pub const HEADER_TARGET: &str = "Header";
pub const DEFAULT_USER_NAME: &str = "Ryan";

/// In-memory user record the demo header reads from.
pub struct UserStore {
    user_name: RwLock<String>,
    latency: Duration,
}

impl UserStore {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: RwLock::new(user_name.into()),
            latency: Duration::ZERO,
        }
    }

    /// Simulated lookup latency, to exercise suspension inside a pass.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn user_name(&self) -> String {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.user_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_user_name(&self, user_name: impl Into<String>) {
        *self
            .user_name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = user_name.into();
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new(DEFAULT_USER_NAME)
    }
}

pub fn header_target_id() -> TargetId {
    crate::target_id!(HEADER_TARGET)
}

/// Handles to the registered demo targets.
#[derive(Clone, Debug)]
pub struct DemoTargets {
    pub header: Target,
}

pub fn register_demo_targets(registry: &TargetRegistry, store: Arc<UserStore>) -> DemoTargets {
    let header = registry.register(header_target_id(), move |props: Props| {
        let store = Arc::clone(&store);
        async move { render_header(&store, &props).await }
    });
    DemoTargets { header }
}

async fn render_header(store: &UserStore, props: &Props) -> Result<String, FragmentError> {
    let user_name = store.user_name().await;
    let markup = HeaderTemplate {
        title: props.get_str("title").unwrap_or_default(),
        user_name: &user_name,
    }
    .render()?;
    Ok(markup)
}
