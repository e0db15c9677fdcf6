//! Verify: are the Deployments of the installation ready?

use bosun_core::parse_manifest;
use bosun_core::predicate::is_deployment;
use serde::Serialize;
use tracing::debug;

use crate::cluster::ObjectKey;
use crate::error::{KubeError, Result};
use crate::installer::Installer;
use crate::readiness::{is_deployment_ready, replica_failure};

/// Reason reported when every Deployment is ready
pub const VERIFICATION_COMPLETED: &str = "OK";

/// Reason reported while a Deployment is still rolling out
pub const DEPLOYMENT_VERIFICATION_PROCESSING: &str = "DeploymentProcessing";

/// Readiness of an installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub ready: bool,
    pub reason: String,
}

impl VerificationResult {
    fn ready() -> Self {
        Self {
            ready: true,
            reason: VERIFICATION_COMPLETED.to_string(),
        }
    }

    fn not_ready(reason: &str) -> Self {
        Self {
            ready: false,
            reason: reason.to_string(),
        }
    }
}

impl Installer {
    /// Check the live state of every Deployment in the cached manifest
    ///
    /// Nothing cached means nothing installed yet, which is not ready. The
    /// first Deployment still rolling out decides the reason; a replica
    /// failure is reported with its message.
    pub async fn verify(&self) -> Result<VerificationResult> {
        let cached = self.cache.get(&self.cache_key).await?;
        if cached.manifest.is_empty() {
            return Ok(VerificationResult::not_ready(""));
        }

        let deployments = is_deployment();
        for object in parse_manifest(&cached.manifest)?
            .iter()
            .filter(|o| deployments.matches(o))
        {
            let key = ObjectKey::of(object);
            let deployment =
                self.cluster
                    .get_deployment(&key)
                    .await
                    .map_err(|e| KubeError::Verify {
                        resource: key.to_string(),
                        source: Box::new(e),
                    })?;

            if is_deployment_ready(&deployment) {
                continue;
            }

            debug!(deployment = %key, "deployment is not ready");
            if let Some(message) = replica_failure(&deployment) {
                return Ok(VerificationResult::not_ready(&format!(
                    "deployment {key} has replica failure: {message}"
                )));
            }
            return Ok(VerificationResult::not_ready(
                DEPLOYMENT_VERIFICATION_PROCESSING,
            ));
        }

        Ok(VerificationResult::ready())
    }
}
