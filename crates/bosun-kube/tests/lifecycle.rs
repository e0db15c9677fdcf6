//! Integration tests for install, uninstall and verify against an in-memory cluster

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bosun_core::ResourceKey;
use bosun_core::predicate::{has_kind, is_crd};
use bosun_kube::{
    ClusterClient, ContextManifest, InMemoryManifestCache, InstallOptions, Installer,
    ManifestCache, MockCluster, ObjectKey, SecretManifestCache, StaticRenderer, UninstallOptions,
    fire_all_post_uninstall, post_uninstall_hook, pre_apply_hook, pre_apply_with_predicate,
};

const CRD_AND_DEPLOYMENT: &str = "\
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: functions.serverless.kyma-project.io
spec:
  group: serverless.kyma-project.io
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: serverless-ctrl-mngr
  namespace: kyma-system
spec:
  replicas: 1
";

const DEPLOYMENT_ONLY: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: serverless-ctrl-mngr
  namespace: kyma-system
spec:
  replicas: 1
";

fn cache_key() -> ObjectKey {
    ObjectKey::new("kyma-system", "default")
}

fn crd_key() -> ResourceKey {
    ResourceKey::new(
        "CustomResourceDefinition",
        "",
        "functions.serverless.kyma-project.io",
    )
}

fn deployment_key() -> ResourceKey {
    ResourceKey::new("Deployment", "kyma-system", "serverless-ctrl-mngr")
}

fn installer(cluster: &MockCluster, cache: Arc<dyn ManifestCache>, manifest: &str) -> Installer {
    Installer::builder()
        .cluster(Arc::new(cluster.clone()))
        .cache(cache)
        .cache_key(cache_key())
        .renderer(StaticRenderer::new(manifest))
        .manager_name("serverless-operator")
        .manager_uid("uid-42")
        .build()
        .unwrap()
}

mod install {
    use super::*;

    #[tokio::test]
    async fn test_removed_crd_is_deleted_and_cache_updated() {
        let cluster = MockCluster::new();
        let cache: Arc<dyn ManifestCache> = Arc::new(InMemoryManifestCache::new());
        cache
            .set(
                &cache_key(),
                ContextManifest {
                    manager_uid: "uid-42".to_string(),
                    manifest: CRD_AND_DEPLOYMENT.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        installer(&cluster, Arc::clone(&cache), CRD_AND_DEPLOYMENT)
            .install(&InstallOptions::new())
            .await
            .unwrap();
        assert!(cluster.contains(&crd_key()));

        let summary = installer(&cluster, Arc::clone(&cache), DEPLOYMENT_ONLY)
            .install(&InstallOptions::new())
            .await
            .unwrap();

        assert_eq!(summary.applied, vec![deployment_key()]);
        assert_eq!(summary.removed, vec![crd_key()]);
        assert!(!cluster.contains(&crd_key()));
        assert!(cluster.contains(&deployment_key()));
        assert_eq!(
            cache.get(&cache_key()).await.unwrap().manifest,
            DEPLOYMENT_ONLY
        );
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let cluster = MockCluster::new();
        let cache: Arc<dyn ManifestCache> = Arc::new(InMemoryManifestCache::new());
        let installer = installer(&cluster, Arc::clone(&cache), CRD_AND_DEPLOYMENT);
        let options = InstallOptions::new();

        installer.install(&options).await.unwrap();
        let first_entry = cache.get(&cache_key()).await.unwrap();
        let first_objects = cluster.object_keys();

        let second = installer.install(&options).await.unwrap();

        assert!(second.removed.is_empty());
        assert!(second.is_clean());
        assert_eq!(cluster.operation_counts().deletes, 0);
        assert_eq!(cluster.object_keys(), first_objects);
        assert_eq!(cache.get(&cache_key()).await.unwrap(), first_entry);
    }

    #[tokio::test]
    async fn test_pre_apply_predicate_hook_only_sees_matches() {
        let cluster = MockCluster::new();
        let cache: Arc<dyn ManifestCache> = Arc::new(InMemoryManifestCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hook = pre_apply_with_predicate(
            pre_apply_hook(move |r| {
                counter.fetch_add(1, Ordering::SeqCst);
                r.set_annotation("replicas-managed", "true");
                Ok(())
            }),
            has_kind("Deployment"),
        );

        installer(&cluster, cache, CRD_AND_DEPLOYMENT)
            .install(&InstallOptions::new().with_pre_apply(hook))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let deployment = cluster.object(&deployment_key()).unwrap();
        assert_eq!(deployment.annotation("replicas-managed"), Some("true"));
        let crd = cluster.object(&crd_key()).unwrap();
        assert_eq!(crd.annotation("replicas-managed"), None);
    }

    #[tokio::test]
    async fn test_install_with_secret_cache() {
        let cluster = MockCluster::new();
        let cache: Arc<dyn ManifestCache> =
            Arc::new(SecretManifestCache::new(Arc::new(cluster.clone())));

        installer(&cluster, Arc::clone(&cache), CRD_AND_DEPLOYMENT)
            .install(&InstallOptions::new())
            .await
            .unwrap();

        assert!(cluster.secret(&cache_key()).is_some());
        let entry = cache.get(&cache_key()).await.unwrap();
        assert_eq!(entry.manager_uid, "uid-42");
        assert_eq!(entry.manifest, CRD_AND_DEPLOYMENT);
    }
}

mod uninstall {
    use super::*;

    async fn installed(cluster: &MockCluster) -> (Installer, Arc<dyn ManifestCache>) {
        let cache: Arc<dyn ManifestCache> = Arc::new(InMemoryManifestCache::new());
        let installer = installer(cluster, Arc::clone(&cache), CRD_AND_DEPLOYMENT);
        installer.install(&InstallOptions::new()).await.unwrap();
        cluster.reset_counts();
        (installer, cache)
    }

    #[tokio::test]
    async fn test_stuck_object_blocks_hooks_and_cache_removal() {
        let cluster = MockCluster::new();
        let (installer, cache) = installed(&cluster).await;
        cluster.hold_deletion(&deployment_key());

        let hook_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hook_calls);
        let options = UninstallOptions::new().with_post_uninstall(post_uninstall_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }));

        for _ in 0..3 {
            assert!(!installer.uninstall(&options).await.unwrap());
            assert_eq!(hook_calls.load(Ordering::SeqCst), 0);
            assert!(!cache.get(&cache_key()).await.unwrap().is_empty());
        }

        cluster.release(&deployment_key());
        assert!(installer.uninstall(&options).await.unwrap());
        assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
        assert!(cache.get(&cache_key()).await.unwrap().is_empty());
        assert!(cluster.object_keys().is_empty());
    }

    #[tokio::test]
    async fn test_workloads_removed_before_crds() {
        let cluster = MockCluster::new();
        let (installer, _) = installed(&cluster).await;
        cluster.hold_deletion(&deployment_key());
        let options = UninstallOptions::new().with_uninstall_first(has_kind("Deployment"));

        assert!(!installer.uninstall(&options).await.unwrap());
        assert!(cluster.contains(&crd_key()));

        cluster.release(&deployment_key());
        assert!(installer.uninstall(&options).await.unwrap());
        assert_eq!(cluster.delete_log().last(), Some(&crd_key()));
    }

    #[tokio::test]
    async fn test_pending_hook_is_retried() {
        let cluster = MockCluster::new();
        let (installer, cache) = installed(&cluster).await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        // Reports done from the second attempt on, for the CRD only
        let options = UninstallOptions::new().with_post_uninstall(post_uninstall_hook(move |r| {
            if !is_crd().matches(r) {
                return Ok(true);
            }
            Ok(counter.fetch_add(1, Ordering::SeqCst) >= 1)
        }));

        assert!(!installer.uninstall(&options).await.unwrap());
        assert!(!cache.get(&cache_key()).await.unwrap().is_empty());

        assert!(installer.uninstall(&options).await.unwrap());
        assert!(cache.get(&cache_key()).await.unwrap().is_empty());
    }
}

mod hooks {
    use super::*;
    use bosun_core::Resource;
    use bosun_kube::{KubeError, PreApplyHook};

    #[tokio::test]
    async fn test_three_hooks_second_not_done() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = |done: bool| {
            let calls = Arc::clone(&calls);
            post_uninstall_hook(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(done)
            })
        };
        let hooks = vec![hook(true), hook(false), hook(true)];

        let done = fire_all_post_uninstall(&hooks, &Resource::default())
            .await
            .unwrap();

        assert!(!done);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_predicate_hook_never_called_when_false_and_error_unchanged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hook = pre_apply_with_predicate(
            pre_apply_hook(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(KubeError::Hook("invalid object".to_string()))
            }),
            is_crd(),
        );

        let mut config_map = Resource::new("v1", "ConfigMap", "cm");
        for _ in 0..5 {
            hook.pre_apply(&mut config_map).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut crd = Resource::new("apiextensions.k8s.io/v1", "CustomResourceDefinition", "c");
        let err = hook.pre_apply(&mut crd).await.unwrap_err();
        assert!(matches!(err, KubeError::Hook(ref m) if m == "invalid object"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

mod cache {
    use super::*;

    #[tokio::test]
    async fn test_get_never_written_key_both_backends() {
        let cluster = MockCluster::new();
        let backends: Vec<Arc<dyn ManifestCache>> = vec![
            Arc::new(InMemoryManifestCache::new()),
            Arc::new(SecretManifestCache::new(Arc::new(cluster.clone()))),
        ];

        for backend in backends {
            let entry = backend.get(&ObjectKey::new("ns", "never")).await.unwrap();
            assert_eq!(entry, ContextManifest::default());
            backend.delete(&ObjectKey::new("ns", "never")).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_secret_cache_survives_new_instances() {
        let cluster = MockCluster::new();
        let client: Arc<dyn ClusterClient> = Arc::new(cluster.clone());
        let entry = ContextManifest {
            manager_uid: "uid".to_string(),
            manifest: DEPLOYMENT_ONLY.to_string(),
            ..Default::default()
        };

        SecretManifestCache::new(Arc::clone(&client))
            .set(&cache_key(), entry.clone())
            .await
            .unwrap();

        let reread = SecretManifestCache::new(client).get(&cache_key()).await.unwrap();
        assert_eq!(reread, entry);
    }
}

mod verify {
    use super::*;
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, DeploymentStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn live_deployment(ready: bool) -> Deployment {
        let progressing_reason = if ready {
            "NewReplicaSetAvailable"
        } else {
            "ReplicaSetUpdated"
        };
        Deployment {
            metadata: ObjectMeta {
                name: Some("serverless-ctrl-mngr".to_string()),
                namespace: Some("kyma-system".to_string()),
                generation: Some(1),
                ..Default::default()
            },
            status: Some(DeploymentStatus {
                observed_generation: Some(1),
                conditions: Some(vec![
                    DeploymentCondition {
                        type_: "Available".to_string(),
                        status: "True".to_string(),
                        reason: Some("MinimumReplicasAvailable".to_string()),
                        ..Default::default()
                    },
                    DeploymentCondition {
                        type_: "Progressing".to_string(),
                        status: "True".to_string(),
                        reason: Some(progressing_reason.to_string()),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_install_then_verify() {
        let cluster = MockCluster::new();
        let installer = installer(
            &cluster,
            Arc::new(InMemoryManifestCache::new()),
            CRD_AND_DEPLOYMENT,
        );

        let before = installer.verify().await.unwrap();
        assert!(!before.ready);

        installer.install(&InstallOptions::new()).await.unwrap();
        cluster.set_deployment(live_deployment(false));
        let rolling = installer.verify().await.unwrap();
        assert!(!rolling.ready);
        assert_eq!(rolling.reason, "DeploymentProcessing");

        cluster.set_deployment(live_deployment(true));
        let done = installer.verify().await.unwrap();
        assert!(done.ready);
        assert_eq!(done.reason, "OK");
    }
}
