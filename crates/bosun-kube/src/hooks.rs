//! Hooks run around install and uninstall
//!
//! - **Pre-apply** hooks run on every object of the rendered manifest before
//!   it is applied and may mutate it.
//! - **Post-uninstall** hooks run on every object once it is confirmed gone
//!   and report whether their own cleanup is complete.
//!
//! Hooks are plain trait objects. Closures can be turned into hooks with
//! [`pre_apply_hook`] and [`post_uninstall_hook`], and any hook can be
//! restricted to matching objects with the `*_with_predicate` wrappers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bosun_core::{Predicate, Resource};

use crate::error::Result;

/// Mutates an object before it is applied
#[async_trait]
pub trait PreApplyHook: Send + Sync {
    async fn pre_apply(&self, resource: &mut Resource) -> Result<()>;
}

/// Runs after an object is gone; returns `false` while its cleanup is still pending
#[async_trait]
pub trait PostUninstallHook: Send + Sync {
    async fn post_uninstall(&self, resource: &Resource) -> Result<bool>;
}

/// Shared pre-apply hook
pub type SharedPreApplyHook = Arc<dyn PreApplyHook>;

/// Shared post-uninstall hook
pub type SharedPostUninstallHook = Arc<dyn PostUninstallHook>;

struct FnHook<F>(F);

#[async_trait]
impl<F> PreApplyHook for FnHook<F>
where
    F: Fn(&mut Resource) -> Result<()> + Send + Sync,
{
    async fn pre_apply(&self, resource: &mut Resource) -> Result<()> {
        (self.0)(resource)
    }
}

struct FnPostHook<F>(F);

#[async_trait]
impl<F> PostUninstallHook for FnPostHook<F>
where
    F: Fn(&Resource) -> Result<bool> + Send + Sync,
{
    async fn post_uninstall(&self, resource: &Resource) -> Result<bool> {
        (self.0)(resource)
    }
}

/// Pre-apply hook from a closure
pub fn pre_apply_hook<F>(f: F) -> SharedPreApplyHook
where
    F: Fn(&mut Resource) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnHook(f))
}

/// Post-uninstall hook from a closure
pub fn post_uninstall_hook<F>(f: F) -> SharedPostUninstallHook
where
    F: Fn(&Resource) -> Result<bool> + Send + Sync + 'static,
{
    Arc::new(FnPostHook(f))
}

/// A hook that only runs on objects matching a predicate
pub struct WithPredicate<H: ?Sized> {
    predicate: Predicate,
    hook: Arc<H>,
}

impl<H: ?Sized> fmt::Debug for WithPredicate<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithPredicate")
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PreApplyHook for WithPredicate<dyn PreApplyHook> {
    async fn pre_apply(&self, resource: &mut Resource) -> Result<()> {
        if !self.predicate.matches(resource) {
            return Ok(());
        }
        self.hook.pre_apply(resource).await
    }
}

#[async_trait]
impl PostUninstallHook for WithPredicate<dyn PostUninstallHook> {
    async fn post_uninstall(&self, resource: &Resource) -> Result<bool> {
        // Non-matching objects need no cleanup from this hook
        if !self.predicate.matches(resource) {
            return Ok(true);
        }
        self.hook.post_uninstall(resource).await
    }
}

/// Run `hook` only on objects matching `predicate`; others pass unchanged
pub fn pre_apply_with_predicate(
    hook: SharedPreApplyHook,
    predicate: Predicate,
) -> SharedPreApplyHook {
    Arc::new(WithPredicate { predicate, hook })
}

/// Run `hook` only on objects matching `predicate`; others report done
pub fn post_uninstall_with_predicate(
    hook: SharedPostUninstallHook,
    predicate: Predicate,
) -> SharedPostUninstallHook {
    Arc::new(WithPredicate { predicate, hook })
}

/// Run all pre-apply hooks in order, stopping at the first error
pub async fn fire_all_pre_apply(hooks: &[SharedPreApplyHook], resource: &mut Resource) -> Result<()> {
    for hook in hooks {
        hook.pre_apply(resource).await?;
    }
    Ok(())
}

/// Run all post-uninstall hooks in order; done only if every hook is done
///
/// A failing hook stops the sequence and its error is returned unchanged.
pub async fn fire_all_post_uninstall(
    hooks: &[SharedPostUninstallHook],
    resource: &Resource,
) -> Result<bool> {
    let mut done = true;
    for hook in hooks {
        done &= hook.post_uninstall(resource).await?;
    }
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KubeError;
    use bosun_core::predicate::{has_kind, is_crd};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_pre_apply(counter: Arc<AtomicUsize>) -> SharedPreApplyHook {
        pre_apply_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn counting_post_uninstall(counter: Arc<AtomicUsize>, done: bool) -> SharedPostUninstallHook {
        post_uninstall_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(done)
        })
    }

    #[tokio::test]
    async fn test_pre_apply_hooks_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let hooks: Vec<SharedPreApplyHook> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                pre_apply_hook(move |r| {
                    order.lock().unwrap().push(i);
                    r.set_annotation(&format!("hook-{i}"), "ran");
                    Ok(())
                })
            })
            .collect();

        let mut resource = Resource::new("v1", "ConfigMap", "cm");
        fire_all_pre_apply(&hooks, &mut resource).await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(resource.annotations().len(), 3);
    }

    #[tokio::test]
    async fn test_pre_apply_stops_on_error() {
        let after = Arc::new(AtomicUsize::new(0));
        let hooks = vec![
            pre_apply_hook(|_| Err(KubeError::Hook("boom".to_string()))),
            counting_pre_apply(Arc::clone(&after)),
        ];

        let err = fire_all_pre_apply(&hooks, &mut Resource::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KubeError::Hook(ref m) if m == "boom"));
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_hook_lists() {
        let mut resource = Resource::default();
        fire_all_pre_apply(&[], &mut resource).await.unwrap();
        assert!(fire_all_post_uninstall(&[], &resource).await.unwrap());
    }

    #[tokio::test]
    async fn test_post_uninstall_ands_results_and_runs_all() {
        let counter = Arc::new(AtomicUsize::new(0));
        let hooks = vec![
            counting_post_uninstall(Arc::clone(&counter), true),
            counting_post_uninstall(Arc::clone(&counter), false),
            counting_post_uninstall(Arc::clone(&counter), true),
        ];

        let done = fire_all_post_uninstall(&hooks, &Resource::default())
            .await
            .unwrap();
        assert!(!done);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_post_uninstall_error_stops_sequence() {
        let counter = Arc::new(AtomicUsize::new(0));
        let hooks = vec![
            counting_post_uninstall(Arc::clone(&counter), true),
            post_uninstall_hook(|_| Err(KubeError::Hook("cleanup failed".to_string()))),
            counting_post_uninstall(Arc::clone(&counter), true),
        ];

        let err = fire_all_post_uninstall(&hooks, &Resource::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KubeError::Hook(ref m) if m == "cleanup failed"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pre_apply_with_predicate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let hook = pre_apply_with_predicate(counting_pre_apply(Arc::clone(&counter)), is_crd());

        let mut crd = Resource::new("apiextensions.k8s.io/v1", "CustomResourceDefinition", "x");
        let mut cm = Resource::new("v1", "ConfigMap", "y");
        hook.pre_apply(&mut crd).await.unwrap();
        hook.pre_apply(&mut cm).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_post_uninstall_with_predicate_skips_as_done() {
        let counter = Arc::new(AtomicUsize::new(0));
        let hook = post_uninstall_with_predicate(
            counting_post_uninstall(Arc::clone(&counter), false),
            has_kind("Deployment"),
        );

        let skipped = hook
            .post_uninstall(&Resource::new("v1", "Service", "svc"))
            .await
            .unwrap();
        assert!(skipped);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let matched = hook
            .post_uninstall(&Resource::new("apps/v1", "Deployment", "web"))
            .await
            .unwrap();
        assert!(!matched);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
