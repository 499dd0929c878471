//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;

use crate::session::DEFAULT_SESSION;
use crate::updates::RELEASES_API;

/// samlhealth - Installation health diagnostics for SimpleSAMLphp.
#[derive(Debug, Parser)]
#[command(name = "samlhealth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check prerequisites and collect deployment warnings
    Check(CheckArgs),

    /// Check that a private key belongs to a certificate
    Keypair(KeypairArgs),
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CheckArgs {
    /// Deployment configuration (YAML or JSON, or config.php with --php-config)
    #[arg(short, long, env = "SAMLHEALTH_CONFIG")]
    pub config: PathBuf,

    /// Read the configuration from a PHP config.php through the interpreter
    #[arg(long)]
    pub php_config: bool,

    /// Metadata directory (overrides the configured metadatadir)
    #[arg(long)]
    pub metadata_dir: Option<PathBuf>,

    /// Host name used to pick the hosted IdP entry
    #[arg(long)]
    pub host: Option<String>,

    /// URL the deployment is reached at (decides the HTTPS warning)
    #[arg(long)]
    pub url: Option<String>,

    /// PHP interpreter to probe
    #[arg(long, default_value = "php", env = "SAMLHEALTH_PHP")]
    pub php: PathBuf,

    /// Session the release check is cached under
    #[arg(long, default_value = DEFAULT_SESSION)]
    pub session: String,

    /// Directory for session cache files
    #[arg(long, env = "SAMLHEALTH_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Releases endpoint queried by the update check
    #[arg(long, default_value = RELEASES_API, hide = true)]
    pub releases_url: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `keypair` command.
#[derive(Clone, clap::Args)]
pub struct KeypairArgs {
    /// PEM certificate
    #[arg(long)]
    pub certificate: PathBuf,

    /// PEM private key
    #[arg(long)]
    pub private_key: PathBuf,

    /// Passphrase of an encrypted private key
    #[arg(long, env = "SAMLHEALTH_KEY_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,
}

impl fmt::Debug for KeypairArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairArgs")
            .field("certificate", &self.certificate)
            .field("private_key", &self.private_key)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_defaults() {
        let cli = Cli::try_parse_from(["samlhealth", "check", "--config", "config.yml"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.config, PathBuf::from("config.yml"));
        assert_eq!(args.php, PathBuf::from("php"));
        assert_eq!(args.session, "default");
        assert_eq!(args.releases_url, RELEASES_API);
        assert!(!args.json);
        assert!(!args.php_config);
    }

    #[test]
    fn parses_keypair() {
        let cli = Cli::try_parse_from([
            "samlhealth",
            "--no-color",
            "keypair",
            "--certificate",
            "idp.crt",
            "--private-key",
            "idp.pem",
            "--passphrase",
            "secret",
        ])
        .unwrap();
        assert!(cli.no_color);
        let Commands::Keypair(args) = cli.command else {
            panic!("expected keypair");
        };
        assert_eq!(args.private_key, PathBuf::from("idp.pem"));
        assert_eq!(args.passphrase.as_deref(), Some("secret"));
    }

    #[test]
    fn debug_output_redacts_passphrase() {
        let cli = Cli::try_parse_from([
            "samlhealth",
            "keypair",
            "--certificate",
            "c",
            "--private-key",
            "k",
            "--passphrase",
            "hunter2",
        ])
        .unwrap();
        assert!(!format!("{:?}", cli).contains("hunter2"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["samlhealth", "check", "-c", "c.yml", "--debug", "--json"]).unwrap();
        assert!(cli.debug);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["samlhealth"]).is_err());
    }
}
