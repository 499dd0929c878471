//! Check command implementation.
//!
//! The `samlhealth check` command builds the prerequisite matrix and the
//! deployment warnings for one deployment and prints them.

use crate::cli::args::CheckArgs;
use crate::config::{load_config_file, load_php_config, DeploymentConfig};
use crate::crypto::FileKeyLoader;
use crate::error::{HealthError, Result};
use crate::metadata::FileMetadataProvider;
use crate::report::{DeploymentSummary, HealthReport};
use crate::requirements::{CapabilityProbe, InterpreterProbe, PrerequisiteMatrixBuilder};
use crate::session::{default_state_dir, FileSessionCache};
use crate::ui::UserInterface;
use crate::updates::{HttpFetcher, ReqwestFetcher};
use crate::warnings::{DeploymentWarningAggregator, TransportInfo};

use super::dispatcher::{Command, CommandResult};
use super::display;

/// The check command implementation.
pub struct CheckCommand {
    args: CheckArgs,
    probe: Option<Box<dyn CapabilityProbe>>,
    fetcher: Box<dyn HttpFetcher>,
}

impl CheckCommand {
    /// Create a check command probing the configured interpreter.
    ///
    /// The interpreter is probed with the deployment's Composer autoloader
    /// once the configuration (and so `basedir`) is known.
    pub fn new(args: CheckArgs) -> Self {
        Self {
            args,
            probe: None,
            fetcher: Box::new(ReqwestFetcher::new()),
        }
    }

    /// Use a different capability probe.
    pub fn with_probe(mut self, probe: impl CapabilityProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Use a different HTTP fetcher.
    pub fn with_fetcher(mut self, fetcher: impl HttpFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Get the command arguments.
    pub fn args(&self) -> &CheckArgs {
        &self.args
    }

    fn load_config(&self) -> Result<DeploymentConfig> {
        if self.args.php_config {
            load_php_config(&self.args.php, &self.args.config)
        } else {
            load_config_file(&self.args.config)
        }
    }

    fn metadata(&self, config: &DeploymentConfig) -> FileMetadataProvider {
        let provider = match &self.args.metadata_dir {
            Some(dir) => FileMetadataProvider::new(dir),
            None => FileMetadataProvider::from_config(config),
        };
        match &self.args.host {
            Some(host) => provider.with_host(host),
            None => provider,
        }
    }

    /// Transport from `--url`, else from an absolute `baseurlpath`.
    fn transport(&self, config: &DeploymentConfig) -> TransportInfo {
        let explicit = self.args.url.as_deref().and_then(TransportInfo::from_url);
        explicit
            .or_else(|| TransportInfo::from_config(config))
            .unwrap_or_else(|| {
                tracing::debug!("Transport unknown, assuming plain HTTP");
                TransportInfo::new(false)
            })
    }

    fn interpreter(&self, config: &DeploymentConfig) -> InterpreterProbe {
        InterpreterProbe::new(&self.args.php).with_base_dir(config.base_dir())
    }

    fn report(&self, config: &DeploymentConfig) -> Result<HealthReport> {
        let interpreter;
        let probe: &dyn CapabilityProbe = match &self.probe {
            Some(probe) => probe.as_ref(),
            None => {
                interpreter = self.interpreter(config);
                &interpreter
            }
        };

        let matrix = PrerequisiteMatrixBuilder::new(probe).build(
            config,
            &self.metadata(config),
            &FileKeyLoader::from_config(config),
        );

        let state_dir = self.args.state_dir.clone().unwrap_or_else(default_state_dir);
        let mut cache = FileSessionCache::open(&state_dir, &self.args.session)?;
        let warnings = DeploymentWarningAggregator::new(probe)
            .releases_url(self.args.releases_url.as_str())
            .collect(
                config,
                &self.transport(config),
                &mut cache,
                self.fetcher.as_ref(),
            );

        Ok(HealthReport::new(
            DeploymentSummary::from_config(config),
            matrix,
            warnings,
        ))
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = match self.load_config() {
            Ok(c) => c,
            Err(HealthError::ConfigNotFound { path }) => {
                ui.error(&format!("No configuration found at {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };

        let report = self.report(&config)?;

        if self.args.json {
            display::print_json(ui, &report)?;
        } else {
            display::show_report(ui, &report);
        }

        if report.is_healthy() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::{FeatureId, StaticProbe};
    use crate::ui::MockUI;
    use crate::updates::{FetchError, FetchRequest, FetchResponse, RELEASES_API};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Offline;

    impl HttpFetcher for Offline {
        fn get(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, FetchError> {
            Err(FetchError::Unavailable {
                url: request.url.clone(),
                message: "offline".to_string(),
            })
        }
    }

    fn args(config: &Path, state: &Path) -> CheckArgs {
        CheckArgs {
            config: config.to_path_buf(),
            php_config: false,
            metadata_dir: None,
            host: None,
            url: Some("https://idp.example.org/".to_string()),
            php: "php".into(),
            session: "test".to_string(),
            state_dir: Some(state.to_path_buf()),
            releases_url: RELEASES_API.to_string(),
            json: false,
        }
    }

    fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join("config.yml");
        fs::write(&path, content).unwrap();
        path
    }

    fn runtime() -> StaticProbe {
        StaticProbe::all()
            .without(FeatureId::Suhosin)
            .with_version("8.2.7")
    }

    #[test]
    fn healthy_deployment_exits_zero() {
        let temp = TempDir::new().unwrap();
        let config = write_config(
            temp.path(),
            "auth.adminpassword: s3cure\ntechnicalcontact_email: ops@example.org\nsecretsalt: abc\n",
        );

        let cmd = CheckCommand::new(args(&config, temp.path()))
            .with_probe(runtime())
            .with_fetcher(Offline);
        let mut ui = MockUI::new();
        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_success("All required prerequisites are met"));
        assert!(ui.warnings().is_empty());
    }

    #[test]
    fn failing_prerequisite_exits_one() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "technicalcontact_email: ops@example.org\n");

        let cmd = CheckCommand::new(args(&config, temp.path()))
            .with_probe(runtime())
            .with_fetcher(Offline);
        let mut ui = MockUI::new();
        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("auth.adminpassword"));
    }

    #[test]
    fn missing_config_exits_two() {
        let temp = TempDir::new().unwrap();
        let cmd = CheckCommand::new(args(&temp.path().join("missing.yml"), temp.path()))
            .with_probe(runtime())
            .with_fetcher(Offline);
        let mut ui = MockUI::new();
        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 2);
        assert!(ui.has_error("No configuration found"));
    }

    #[test]
    fn plain_http_url_adds_warning() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "auth.adminpassword: s3cure\n");
        let mut check_args = args(&config, temp.path());
        check_args.url = Some("http://idp.example.org/".to_string());

        let cmd = CheckCommand::new(check_args)
            .with_probe(runtime())
            .with_fetcher(Offline);
        let mut ui = MockUI::new();
        cmd.execute(&mut ui).unwrap();

        assert!(ui.has_warning("not using HTTPS"));
    }

    #[test]
    fn transport_falls_back_to_baseurlpath() {
        let temp = TempDir::new().unwrap();
        let config = write_config(
            temp.path(),
            "baseurlpath: https://idp.example.org/simplesaml/\n",
        );
        let mut check_args = args(&config, temp.path());
        check_args.url = None;

        let cmd = CheckCommand::new(check_args);
        let loaded = load_config_file(&config).unwrap();
        assert!(cmd.transport(&loaded).encrypted);

        let unknown = DeploymentConfig::new();
        assert!(!cmd.transport(&unknown).encrypted);
    }

    #[test]
    fn interpreter_uses_deployment_autoloader() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("vendor")).unwrap();
        fs::write(temp.path().join("vendor").join("autoload.php"), "<?php\n").unwrap();
        let config = write_config(temp.path(), "store.type: redis\n");

        let cmd = CheckCommand::new(args(&config, temp.path()));
        let loaded = load_config_file(&config).unwrap();
        assert_eq!(
            cmd.interpreter(&loaded).autoloader(),
            Some(temp.path().join("vendor").join("autoload.php").as_path())
        );
    }

    #[test]
    fn json_output_is_machine_readable() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "version: 2.1.0\nauth.adminpassword: s3cure\n");
        let mut check_args = args(&config, temp.path());
        check_args.json = true;

        let cmd = CheckCommand::new(check_args)
            .with_probe(runtime())
            .with_fetcher(Offline);
        let mut ui = MockUI::new();
        cmd.execute(&mut ui).unwrap();

        let json: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(json["deployment"]["version"], "2.1.0");
        assert_eq!(json["healthy"], true);
        assert!(json["prerequisites"].as_array().unwrap().len() >= 19);
    }

    #[test]
    fn invalid_session_id_is_an_error() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path(), "auth.adminpassword: s3cure\n");
        let mut check_args = args(&config, temp.path());
        check_args.session = "../elsewhere".to_string();

        let cmd = CheckCommand::new(check_args)
            .with_probe(runtime())
            .with_fetcher(Offline);
        let err = cmd.execute(&mut MockUI::new()).unwrap_err();
        assert!(matches!(err, HealthError::InvalidSessionId { .. }));
    }
}
