//! The combined health report.

use serde::Serialize;

use crate::config::DeploymentConfig;
use crate::message::Message;
use crate::requirements::status::PrerequisiteMatrix;

/// What is being diagnosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentSummary {
    pub version: String,
    pub directory: String,
    /// Whether the SAML 2.0 identity provider is enabled.
    pub saml20_idp: bool,
}

impl DeploymentSummary {
    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self {
            version: config.version(),
            directory: config.base_dir().display().to_string(),
            saml20_idp: config.boolean("enable.saml20-idp", false),
        }
    }
}

/// Prerequisites and warnings for one deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    deployment: DeploymentSummary,
    healthy: bool,
    prerequisites: PrerequisiteMatrix,
    warnings: Vec<Message>,
}

impl HealthReport {
    pub fn new(
        deployment: DeploymentSummary,
        prerequisites: PrerequisiteMatrix,
        warnings: Vec<Message>,
    ) -> Self {
        Self {
            deployment,
            healthy: prerequisites.is_healthy(),
            prerequisites,
            warnings,
        }
    }

    pub fn deployment(&self) -> &DeploymentSummary {
        &self.deployment
    }

    pub fn prerequisites(&self) -> &PrerequisiteMatrix {
        &self.prerequisites
    }

    pub fn warnings(&self) -> &[Message] {
        &self.warnings
    }

    /// Whether every required prerequisite is met. Warnings do not count.
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }
}
