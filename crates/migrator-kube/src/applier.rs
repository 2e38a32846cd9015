//! Resource Applier (§4.5): the only writer to the target cluster.

use std::time::Duration;

use kube::api::{Api, DynamicObject, Patch, PatchParams};
use kube::core::{GroupVersionKind, TypeMeta};
use kube::discovery::ApiResource;
use kube::Client;
use rand::Rng;

use migrator_core::resource::ResourceObject;

use crate::discovery::{gvk_from_type_meta, DiscoveryClient};
use crate::error::{KubeError, Result};

/// Field manager used for every server-side apply this tool performs.
pub const FIELD_MANAGER: &str = "up-controlplane-migrator";

/// Exponential backoff with jitter, per §4.5: 500ms initial, factor 2, ±10% jitter, 5 attempts.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    initial: Duration,
    factor: f64,
    jitter: f64,
    max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            factor: 2.0,
            jitter: 0.10,
            max_attempts: 5,
        }
    }
}

impl Backoff {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial.as_millis() as f64 * self.factor.powi(attempt as i32);
        let jitter_fraction = rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        let jittered_ms = (base_ms * (1.0 + jitter_fraction)).max(0.0);
        Duration::from_millis(jittered_ms as u64)
    }
}

/// Retry `f` while it returns a retryable error, up to `backoff.max_attempts` total tries.
pub async fn retry_with_backoff<T, F, Fut>(backoff: &Backoff, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < backoff.max_attempts => {
                let delay = backoff.delay_for_attempt(attempt);
                tracing::debug!(attempt, ?delay, error = %err, "retrying after transient error");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn gvk_from_object(object: &ResourceObject) -> Result<GroupVersionKind> {
    let api_version = object
        .api_version()
        .ok_or_else(|| KubeError::Core(missing_field("apiVersion")))?
        .to_string();
    let kind = object
        .kind()
        .ok_or_else(|| KubeError::Core(missing_field("kind")))?
        .to_string();
    Ok(gvk_from_type_meta(&TypeMeta { api_version, kind }))
}

fn missing_field(field: &str) -> migrator_core::CoreError {
    migrator_core::CoreError::MissingField {
        field: field.to_string(),
    }
}

fn make_api(client: &Client, api_resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
    match namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, api_resource),
        None => Api::all_with(client.clone(), api_resource),
    }
}

async fn resolve_with_retry(
    discovery: &DiscoveryClient,
    gvk: &GroupVersionKind,
    backoff: &Backoff,
) -> Result<ApiResource> {
    retry_with_backoff(backoff, || async {
        discovery
            .resolve_gvk(gvk)
            .map(|(api_resource, _capabilities)| api_resource)
            .ok_or_else(|| KubeError::MappingUnknown {
                group: gvk.group.clone(),
                kind: gvk.kind.clone(),
            })
    })
    .await
}

fn to_dynamic_object(object: &ResourceObject) -> Result<DynamicObject> {
    Ok(serde_json::from_value(object.value().clone())?)
}

/// Server-side apply `object`, optionally applying its status subresource too.
///
/// `apply_status_requested` is the caller's intent (§4.9 step 7 sets it, base
/// import never does); `has_status_subresource` comes from the archive's type
/// metadata. Both must hold for the status call to happen (§4.5 step 3).
pub async fn apply(
    discovery: &DiscoveryClient,
    object: &ResourceObject,
    apply_status_requested: bool,
    has_status_subresource: bool,
) -> Result<()> {
    let backoff = Backoff::default();
    let gvk = gvk_from_object(object)?;
    let api_resource = resolve_with_retry(discovery, &gvk, &backoff).await?;

    let name = object
        .name()
        .ok_or_else(|| KubeError::Core(missing_field("metadata.name")))?
        .to_string();
    let namespace = object.namespace().map(str::to_string);
    let api = make_api(discovery.client(), &api_resource, namespace.as_deref());
    let dynamic = to_dynamic_object(object)?;

    retry_with_backoff(&backoff, || async {
        let mut params = PatchParams::apply(FIELD_MANAGER);
        params.force = true;
        api.patch(&name, &params, &Patch::Apply(&dynamic))
            .await
            .map_err(KubeError::classify)?;
        Ok(())
    })
    .await?;

    if apply_status_requested && has_status_subresource {
        let result = retry_with_backoff(&backoff, || async {
            let mut params = PatchParams::apply(FIELD_MANAGER);
            params.force = true;
            api.patch_status(&name, &params, &Patch::Apply(&dynamic))
                .await
                .map_err(KubeError::classify)?;
            Ok(())
        })
        .await;

        match result {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                // The object may have been garbage-collected between the two calls;
                // an acceptable race (§4.5 step 3).
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

/// Fetch → transform → update, used by the category modifier and the pauser.
pub async fn modify<F>(
    discovery: &DiscoveryClient,
    gvk: &GroupVersionKind,
    namespace: Option<&str>,
    name: &str,
    transform: F,
) -> Result<()>
where
    F: Fn(&mut ResourceObject) + Send + Sync,
{
    let backoff = Backoff::default();
    let api_resource = resolve_with_retry(discovery, gvk, &backoff).await?;
    let api = make_api(discovery.client(), &api_resource, namespace);

    retry_with_backoff(&backoff, || async {
        let current = api.get(name).await.map_err(KubeError::classify)?;
        let mut object = ResourceObject::new(serde_json::to_value(&current)?);
        transform(&mut object);
        let dynamic = to_dynamic_object(&object)?;
        let mut params = PatchParams::apply(FIELD_MANAGER);
        params.force = true;
        api.patch(name, &params, &Patch::Apply(&dynamic))
            .await
            .map_err(KubeError::classify)?;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_delay_grows_and_stays_within_jitter_band() {
        let backoff = Backoff::default();
        for attempt in 0..4 {
            let delay = backoff.delay_for_attempt(attempt);
            let base_ms = 500.0 * 2f64.powi(attempt as i32);
            let lower = (base_ms * 0.9) as u128;
            let upper = (base_ms * 1.1) as u128 + 1;
            let got = delay.as_millis();
            assert!(
                got >= lower && got <= upper,
                "attempt {attempt}: expected [{lower}, {upper}], got {got}"
            );
        }
    }

    #[tokio::test]
    async fn retry_with_backoff_stops_after_max_attempts() {
        let backoff = Backoff {
            initial: Duration::from_millis(1),
            factor: 1.0,
            jitter: 0.0,
            max_attempts: 3,
        };
        let mut calls = 0;
        let result: Result<()> = retry_with_backoff(&backoff, || {
            calls += 1;
            async {
                Err(KubeError::MappingUnknown {
                    group: "g".to_string(),
                    kind: "K".to_string(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn retry_with_backoff_returns_immediately_on_non_retryable_error() {
        let backoff = Backoff::default();
        let mut calls = 0;
        let result: Result<()> = retry_with_backoff(&backoff, || {
            calls += 1;
            async {
                Err(KubeError::Timeout {
                    what: "x".to_string(),
                    elapsed: "1s".to_string(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
