//! Wrapper placed around every registered render function.

use std::{fmt, future::Future, sync::Arc};

use futures::future::{self, BoxFuture, FutureExt};
use metrics::counter;
use tracing::{debug, warn};

use crate::domain::{Props, TargetId, TargetName};

use super::{
    context,
    error::{FragmentError, TargetError},
};

/// Tag of the element every rendered instance is wrapped in.
pub const CONTAINER_TAG: &str = "x-target";

/// A fragment-producing function.
pub trait RenderFn: Send + Sync + 'static {
    fn render(&self, props: Props) -> BoxFuture<'static, Result<String, FragmentError>>;
}

impl<F, Fut> RenderFn for F
where
    F: Fn(Props) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, FragmentError>> + Send + 'static,
{
    fn render(&self, props: Props) -> BoxFuture<'static, Result<String, FragmentError>> {
        (self)(props).boxed()
    }
}

/// A render function bound to its [`TargetId`].
///
/// Calling it records the invocation in the active render pass and wraps the
/// produced markup in an `<x-target>` container.
#[derive(Clone)]
pub struct Target {
    id: TargetId,
    render: Arc<dyn RenderFn>,
}

impl Target {
    pub fn new(id: TargetId, render: impl RenderFn) -> Self {
        Self {
            id,
            render: Arc::new(render),
        }
    }

    pub fn id(&self) -> &TargetId {
        &self.id
    }

    /// Render one instance.
    ///
    /// The name check and the insertion into the pass happen before this
    /// returns, so entries keep call order even when the returned futures are
    /// polled concurrently.
    pub fn call(&self, props: Props) -> BoxFuture<'static, Result<String, TargetError>> {
        let name = match context::record(self.id.clone(), props.clone()) {
            Ok(name) => name,
            Err(err) => {
                warn!(target_id = %self.id, error = %err, "target invocation rejected");
                return future::ready(Err(err)).boxed();
            }
        };

        debug!(target_id = %self.id, name = %name, "target invoked");
        counter!("retarget_target_render_total").increment(1);

        let id = self.id.clone();
        let render = self.render.render(props);
        async move {
            match render.await {
                Ok(markup) => Ok(wrap_markup(&id, &name, &markup)),
                Err(source) => Err(TargetError::Render { id, name, source }),
            }
        }
        .boxed()
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target").field("id", &self.id).finish()
    }
}

/// Wrap `markup` in the container the client uses to find this instance.
pub fn wrap_markup(id: &TargetId, name: &TargetName, markup: &str) -> String {
    format!(
        r#"<{CONTAINER_TAG} type="{}" name="{}">{markup}</{CONTAINER_TAG}>"#,
        escape_attribute(id.as_str()),
        escape_attribute(name.as_str()),
    )
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}
