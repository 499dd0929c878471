//! Prerequisite matrix construction.
//!
//! The matrix is rebuilt from scratch on every run, in a fixed order that
//! mirrors how it is presented:
//!
//! 1. Runtime version against [`MINIMUM_PLATFORM_VERSION`]
//! 2. Built-in capabilities, always required
//! 3. Capabilities required only when a feature using them is configured
//! 4. Optional libraries, required only for the matching store backend
//! 5. Configuration sanity (contact address, admin password)
//! 6. Signing key pairs, when the IdP or metadata signing is enabled
//!
//! For the conditional checks, one boolean decides both the requirement
//! level and which description is shown.

use crate::config::DeploymentConfig;
use crate::crypto::keypair;
use crate::crypto::keys::{KeyMaterialProvider, PrivateKeyMaterial};
use crate::message::Message;
use crate::metadata::{MetadataProvider, MetadataSet};
use crate::requirements::probe::{CapabilityProbe, FeatureId};
use crate::requirements::status::{CheckResult, PrerequisiteMatrix, RequirementLevel};
use crate::updates::version::{display_version, satisfies_minimum};

/// Oldest runtime version the deployment supports.
pub const MINIMUM_PLATFORM_VERSION: &str = "7.4";

/// Runtime version check; `%minimum%` and `%current%` are filled in.
pub const PLATFORM_VERSION: &str = "PHP %minimum% or newer is needed. You are running: %current%";
/// Technical contact address differs from the shipped placeholder.
pub const TECHNICAL_CONTACT: &str =
    "The technicalcontact_email configuration option should be set";
/// Admin password differs from the shipped placeholder.
pub const ADMIN_PASSWORD: &str = "The auth.adminpassword configuration option must be set";
/// Hosted IdP entry exists; only listed, as failed, when it does not.
pub const HOSTED_METADATA_PRESENT: &str = "Hosted IdP metadata present";
/// Hosted IdP private key matches its certificate.
pub const SIGNING_KEY_PAIR: &str = "Matching key-pair for signing assertions";
/// New key staged for rollover matches its certificate.
pub const ROLLOVER_KEY_PAIR: &str = "Matching key-pair for signing assertions (rollover key)";
/// Metadata signing key matches its certificate.
pub const METADATA_KEY_PAIR: &str = "Matching key-pair for signing metadata";

/// Placeholder values shipped in the default configuration.
const DEFAULT_TECHNICAL_CONTACT: &str = "na@example.org";
const DEFAULT_ADMIN_PASSWORD: &str = "123";

/// Key option prefix of the rollover signing pair.
const ROLLOVER_PREFIX: &str = "new_";
/// Key option prefix of the metadata signing pair.
const METADATA_SIGN_PREFIX: &str = "metadata.sign.";

/// A capability every deployment needs.
struct BuiltinCheck {
    feature: FeatureId,
    descr: &'static str,
}

const BUILTIN_CHECKS: &[BuiltinCheck] = &[
    BuiltinCheck {
        feature: FeatureId::DateTime,
        descr: "Date/Time Extension",
    },
    BuiltinCheck {
        feature: FeatureId::Hashing,
        descr: "Hashing function",
    },
    BuiltinCheck {
        feature: FeatureId::Zlib,
        descr: "ZLib",
    },
    BuiltinCheck {
        feature: FeatureId::OpenSslSigning,
        descr: "OpenSSL",
    },
    BuiltinCheck {
        feature: FeatureId::XmlDom,
        descr: "XML DOM",
    },
    BuiltinCheck {
        feature: FeatureId::Regex,
        descr: "Regular expression support",
    },
    BuiltinCheck {
        feature: FeatureId::Json,
        descr: "JSON support",
    },
    BuiltinCheck {
        feature: FeatureId::Spl,
        descr: "Standard PHP library (SPL)",
    },
    BuiltinCheck {
        feature: FeatureId::Multibyte,
        descr: "Multibyte String extension",
    },
];

/// What makes a conditional capability mandatory.
enum Condition {
    /// Automatic update checks are enabled.
    UpdateChecks,
    /// `store.type` selects this backend.
    Store(&'static str),
    /// This module is enabled.
    Module(&'static str),
}

impl Condition {
    fn holds(&self, config: &DeploymentConfig) -> bool {
        match self {
            Condition::UpdateChecks => config.boolean("admin.checkforupdates", true),
            Condition::Store(backend) => config.string("store.type", "") == *backend,
            Condition::Module(module) => config.is_module_enabled(module),
        }
    }
}

/// A capability (or group of alternatives) required only under a condition.
struct ConditionalCheck {
    /// Satisfied if any of these is available.
    features: &'static [FeatureId],
    condition: Condition,
    optional: &'static str,
    required: &'static str,
}

impl ConditionalCheck {
    fn evaluate(&self, probe: &dyn CapabilityProbe, config: &DeploymentConfig) -> CheckResult {
        let needed = self.condition.holds(config);
        let descr = if needed { self.required } else { self.optional };
        let enabled = self.features.iter().any(|f| probe.available(*f));
        CheckResult::new(RequirementLevel::required_if(needed), descr, enabled)
    }
}

const CONDITIONAL_CHECKS: &[ConditionalCheck] = &[
    ConditionalCheck {
        features: &[FeatureId::Curl],
        condition: Condition::UpdateChecks,
        optional: "cURL (might be required by some modules)",
        required: "cURL (required if automatic version checks are used, also by some modules)",
    },
    ConditionalCheck {
        features: &[FeatureId::Session],
        condition: Condition::Store("phpsession"),
        optional: "Session extension (required if PHP sessions are used)",
        required: "Session extension",
    },
    ConditionalCheck {
        features: &[FeatureId::Pdo],
        condition: Condition::Store("sql"),
        optional: "PDO Extension (required if a database backend is used)",
        required: "PDO extension",
    },
    ConditionalCheck {
        features: &[FeatureId::Ldap],
        condition: Condition::Module("ldap"),
        optional: "LDAP extension (required if an LDAP backend is used)",
        required: "LDAP extension",
    },
    ConditionalCheck {
        features: &[FeatureId::Radius],
        condition: Condition::Module("radius"),
        optional: "Radius extension (required if a radius backend is used)",
        required: "Radius extension",
    },
];

const LIBRARY_CHECKS: &[ConditionalCheck] = &[
    ConditionalCheck {
        features: &[FeatureId::Predis],
        condition: Condition::Store("redis"),
        optional: "predis/predis (required if the redis data store is used)",
        required: "predis/predis library",
    },
    ConditionalCheck {
        features: &[FeatureId::Memcache, FeatureId::Memcached],
        condition: Condition::Store("memcache"),
        optional: "Memcache or Memcached extension (required if the memcache backend is used)",
        required: "Memcache or Memcached extension",
    },
];

/// Builds the prerequisite matrix for a deployment.
///
/// # Example
///
/// ```
/// use samlhealth::config::DeploymentConfig;
/// use samlhealth::crypto::FileKeyLoader;
/// use samlhealth::metadata::InMemoryMetadata;
/// use samlhealth::requirements::{PrerequisiteMatrixBuilder, StaticProbe};
///
/// let probe = StaticProbe::all().with_version("8.2.7");
/// let config = DeploymentConfig::new()
///     .with("auth.adminpassword", "correct horse")
///     .with("technicalcontact_email", "ops@example.org");
///
/// let matrix = PrerequisiteMatrixBuilder::new(&probe).build(
///     &config,
///     &InMemoryMetadata::new(),
///     &FileKeyLoader::from_config(&config),
/// );
/// assert!(matrix.is_healthy());
/// ```
pub struct PrerequisiteMatrixBuilder<'a> {
    probe: &'a dyn CapabilityProbe,
    minimum_version: String,
}

impl<'a> PrerequisiteMatrixBuilder<'a> {
    /// Create a builder probing capabilities through `probe`.
    pub fn new(probe: &'a dyn CapabilityProbe) -> Self {
        Self {
            probe,
            minimum_version: MINIMUM_PLATFORM_VERSION.to_string(),
        }
    }

    /// Override the minimum runtime version.
    pub fn minimum_platform_version(mut self, version: impl Into<String>) -> Self {
        self.minimum_version = version.into();
        self
    }

    /// Run every check and return the results in presentation order.
    pub fn build(
        &self,
        config: &DeploymentConfig,
        metadata: &dyn MetadataProvider,
        keys: &dyn KeyMaterialProvider,
    ) -> PrerequisiteMatrix {
        let mut matrix = PrerequisiteMatrix::new();

        matrix.push(self.platform_version_check());

        for check in BUILTIN_CHECKS {
            matrix.push(CheckResult::required(
                check.descr,
                self.probe.available(check.feature),
            ));
        }

        for check in CONDITIONAL_CHECKS.iter().chain(LIBRARY_CHECKS) {
            matrix.push(check.evaluate(self.probe, config));
        }

        matrix.push(CheckResult::optional(
            TECHNICAL_CONTACT,
            config.string("technicalcontact_email", DEFAULT_TECHNICAL_CONTACT)
                != DEFAULT_TECHNICAL_CONTACT,
        ));
        matrix.push(CheckResult::required(
            ADMIN_PASSWORD,
            config.string("auth.adminpassword", DEFAULT_ADMIN_PASSWORD) != DEFAULT_ADMIN_PASSWORD,
        ));

        if config.boolean("enable.saml20-idp", false) {
            idp_key_checks(&mut matrix, metadata, keys);
        }

        if config.boolean("metadata.sign.enable", false) {
            let enabled = verify_configured_pair(keys, config, METADATA_SIGN_PREFIX);
            matrix.push(CheckResult::required(METADATA_KEY_PAIR, enabled));
        }

        tracing::debug!(
            "Built prerequisite matrix with {} checks, {} failing",
            matrix.len(),
            matrix.failures().count()
        );
        matrix
    }

    fn platform_version_check(&self) -> CheckResult {
        let running = self.probe.platform_version();
        let enabled = running
            .as_deref()
            .is_some_and(|v| satisfies_minimum(v, &self.minimum_version));
        let current = running
            .as_deref()
            .map(display_version)
            .unwrap_or("unknown")
            .to_string();

        CheckResult::required(
            Message::with_params(
                PLATFORM_VERSION,
                [
                    ("%minimum%", self.minimum_version.clone()),
                    ("%current%", current),
                ],
            ),
            enabled,
        )
    }
}

/// Key checks for the hosted identity provider.
fn idp_key_checks(
    matrix: &mut PrerequisiteMatrix,
    metadata: &dyn MetadataProvider,
    keys: &dyn KeyMaterialProvider,
) {
    let hosted = match metadata.hosted_metadata(MetadataSet::Saml20IdpHosted) {
        Ok(hosted) => hosted,
        Err(e) => {
            tracing::warn!("Hosted IdP metadata unavailable: {}", e);
            matrix.push(CheckResult::required(HOSTED_METADATA_PRESENT, false));
            return;
        }
    };

    let enabled = verify_configured_pair(keys, &hosted, "");
    matrix.push(CheckResult::required(SIGNING_KEY_PAIR, enabled));

    // A rollover pair is optional; only a configured one is checked.
    match keys.load_private_key(&hosted, false, ROLLOVER_PREFIX) {
        Ok(None) => {}
        Ok(Some(private)) => {
            let enabled = verify_pair(keys, &hosted, ROLLOVER_PREFIX, &private);
            matrix.push(CheckResult::required(ROLLOVER_KEY_PAIR, enabled));
        }
        Err(e) => {
            tracing::warn!("Cannot check rollover key pair: {}", e);
            matrix.push(CheckResult::required(ROLLOVER_KEY_PAIR, false));
        }
    }
}

/// Load and verify a pair that configuration claims is in use.
fn verify_configured_pair(
    keys: &dyn KeyMaterialProvider,
    config: &DeploymentConfig,
    prefix: &str,
) -> bool {
    match keys.load_private_key(config, false, prefix) {
        Ok(Some(private)) => verify_pair(keys, config, prefix, &private),
        Ok(None) => {
            tracing::warn!("No private key configured under '{}privatekey'", prefix);
            false
        }
        Err(e) => {
            tracing::warn!("Cannot check key pair: {}", e);
            false
        }
    }
}

/// Load the certificate matching an already loaded private key and compare.
fn verify_pair(
    keys: &dyn KeyMaterialProvider,
    config: &DeploymentConfig,
    prefix: &str,
    private: &PrivateKeyMaterial,
) -> bool {
    match keys.load_public_key(config, false, prefix) {
        Ok(Some(public)) => {
            keypair::matches(&public.pem, &private.pem, private.passphrase.as_deref())
        }
        Ok(None) => {
            tracing::warn!("No certificate configured under '{}certificate'", prefix);
            false
        }
        Err(e) => {
            tracing::warn!("Cannot check key pair: {}", e);
            false
        }
    }
}
