//! Re-rendering of a client-chosen subset of target instances.

use std::{sync::Arc, time::Duration};

use futures::future::try_join_all;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::targets::{RevalidationPayload, TargetError, TargetRegistry, run_with_targets};

/// Response body of a revalidation request.
///
/// `content[i]` is the markup for the i-th requested entry; `targets` is the
/// render table of this pass only, for the client to merge into its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidationResponse {
    pub content: Vec<String>,
    pub targets: String,
}

#[derive(Clone)]
pub struct RevalidationService {
    registry: Arc<TargetRegistry>,
    timeout: Option<Duration>,
}

impl RevalidationService {
    pub fn new(registry: Arc<TargetRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Bound each revalidation pass; without this a hung fragment hangs the request.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    /// Fail with [`TargetError::UnknownTarget`] unless every id in `payload`
    /// is registered. Lets callers validate a batch before side effects.
    pub fn ensure_known(&self, payload: &RevalidationPayload) -> Result<(), TargetError> {
        payload
            .entries()
            .iter()
            .try_for_each(|invocation| self.registry.get(&invocation.id).map(drop))
            .inspect_err(|err| warn!(error = %err, "revalidation batch rejected"))
    }

    /// Render every entry of `payload` in one fresh pass.
    ///
    /// All ids are resolved before anything renders: a single unknown id
    /// fails the whole batch.
    pub async fn revalidate(
        &self,
        payload: RevalidationPayload,
    ) -> Result<RevalidationResponse, TargetError> {
        let requested = payload.len();
        let calls = payload
            .into_iter()
            .map(|invocation| {
                let target = self.registry.get(&invocation.id)?;
                Ok((target, invocation.props))
            })
            .collect::<Result<Vec<_>, TargetError>>()
            .inspect_err(|err| warn!(error = %err, "revalidation batch rejected"))?;

        let pass = run_with_targets(async move {
            try_join_all(
                calls
                    .into_iter()
                    .map(|(target, props)| target.call(props)),
            )
            .await
        });

        let (content, context) = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pass)
                .await
                .map_err(|_| TargetError::TimedOut)?,
            None => pass.await,
        };
        let content = content?;
        let targets = context.to_json()?;

        counter!("retarget_revalidation_total").increment(1);
        info!(requested, rendered = context.len(), "revalidated targets");

        Ok(RevalidationResponse { content, targets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Invocation, Props, TargetId},
        targets::FragmentError,
    };

    fn registry() -> Arc<TargetRegistry> {
        let registry = TargetRegistry::new();
        registry.register(TargetId::new("food"), |props: Props| async move {
            let food = props.get_str("food").unwrap_or_default().to_string();
            Ok::<_, FragmentError>(format!("<h1>Tons of {food}</h1>"))
        });
        registry.register(TargetId::new("slow"), |_props: Props| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, FragmentError>(String::new())
        });
        Arc::new(registry)
    }

    fn request(id: &str, name: &str) -> Invocation {
        Invocation::new(TargetId::new(id), Props::named(name).with("food", name))
    }

    #[tokio::test]
    async fn content_follows_request_order() {
        let service = RevalidationService::new(registry());
        let response = service
            .revalidate(RevalidationPayload::new(vec![
                request("food", "Broccoli"),
                request("food", "Cauliflower"),
            ]))
            .await
            .expect("revalidate");

        assert_eq!(
            response.content,
            vec![
                r#"<x-target type="food" name="Broccoli"><h1>Tons of Broccoli</h1></x-target>"#,
                r#"<x-target type="food" name="Cauliflower"><h1>Tons of Cauliflower</h1></x-target>"#,
            ]
        );
        assert_eq!(
            response.targets,
            r#"[["Broccoli",["food",{"name":"Broccoli","food":"Broccoli"}]],["Cauliflower",["food",{"name":"Cauliflower","food":"Cauliflower"}]]]"#
        );
    }

    #[tokio::test]
    async fn unknown_target_fails_whole_batch() {
        let service = RevalidationService::new(registry());
        let err = service
            .revalidate(RevalidationPayload::new(vec![
                request("food", "a"),
                request("gone", "b"),
            ]))
            .await
            .expect_err("unknown id");
        assert!(matches!(err, TargetError::UnknownTarget { id } if id.as_str() == "gone"));
    }

    #[test]
    fn ensure_known_checks_every_entry() {
        let service = RevalidationService::new(registry());
        let known = RevalidationPayload::new(vec![request("food", "a"), request("slow", "b")]);
        assert!(service.ensure_known(&known).is_ok());

        let stale = RevalidationPayload::new(vec![request("food", "a"), request("gone", "b")]);
        let err = service.ensure_known(&stale).expect_err("unknown id");
        assert!(matches!(err, TargetError::UnknownTarget { id } if id.as_str() == "gone"));
    }

    #[tokio::test]
    async fn duplicate_names_in_request_fail() {
        let service = RevalidationService::new(registry());
        let err = service
            .revalidate(RevalidationPayload::new(vec![
                request("food", "a"),
                request("food", "a"),
            ]))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, TargetError::DuplicateName { .. }));
    }

    #[tokio::test]
    async fn empty_payload_renders_nothing() {
        let service = RevalidationService::new(registry());
        let response = service
            .revalidate(RevalidationPayload::default())
            .await
            .expect("revalidate");
        assert!(response.content.is_empty());
        assert_eq!(response.targets, "[]");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_bounds_the_pass() {
        let service =
            RevalidationService::new(registry()).with_timeout(Some(Duration::from_secs(1)));
        let err = service
            .revalidate(RevalidationPayload::new(vec![request("slow", "s")]))
            .await
            .expect_err("times out");
        assert!(matches!(err, TargetError::TimedOut));
    }
}
