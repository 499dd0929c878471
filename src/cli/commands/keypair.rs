//! Keypair command implementation.
//!
//! The `samlhealth keypair` command checks a certificate and private key
//! file against each other, outside of any deployment configuration.

use std::fs;

use crate::cli::args::KeypairArgs;
use crate::crypto::{certificate_fingerprint, check, KeyPairError};
use crate::error::{HealthError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The keypair command implementation.
pub struct KeypairCommand {
    args: KeypairArgs,
}

impl KeypairCommand {
    pub fn new(args: KeypairArgs) -> Self {
        Self { args }
    }

    fn read(&self, what: &str, path: &std::path::Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| HealthError::KeyLoadFailed {
            what: what.to_string(),
            message: format!("{}: {}", path.display(), e),
        })
    }
}

impl Command for KeypairCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let certificate = self.read("certificate", &self.args.certificate)?;
        let private_key = self.read("private key", &self.args.private_key)?;

        match certificate_fingerprint(&certificate) {
            Ok(fingerprint) => ui.show_detail("SHA-256 fingerprint", &fingerprint),
            Err(e) => tracing::debug!("No fingerprint: {}", e),
        }

        match check(&certificate, &private_key, self.args.passphrase.as_deref()) {
            Ok(()) => {
                ui.success("Private key matches the certificate");
                Ok(CommandResult::success())
            }
            Err(KeyPairError::Mismatch) => {
                ui.error("Private key does not belong to the certificate");
                Ok(CommandResult::failure(1))
            }
            Err(e) => {
                ui.error(&e.to_string());
                Ok(CommandResult::failure(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use rcgen::generate_simple_self_signed;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_pair(dir: &Path, stem: &str) {
        let generated = generate_simple_self_signed(vec!["idp.example.org".to_string()]).unwrap();
        fs::write(dir.join(format!("{}.crt", stem)), generated.cert.pem()).unwrap();
        fs::write(
            dir.join(format!("{}.pem", stem)),
            generated.key_pair.serialize_pem(),
        )
        .unwrap();
    }

    fn args(dir: &Path, cert: &str, key: &str) -> KeypairArgs {
        KeypairArgs {
            certificate: dir.join(cert),
            private_key: dir.join(key),
            passphrase: None,
        }
    }

    #[test]
    fn matching_pair_succeeds() {
        let temp = TempDir::new().unwrap();
        write_pair(temp.path(), "idp");

        let mut ui = MockUI::new();
        let result = KeypairCommand::new(args(temp.path(), "idp.crt", "idp.pem"))
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_success("matches"));
        assert_eq!(ui.detail("SHA-256 fingerprint").map(str::len), Some(64));
    }

    #[test]
    fn mismatched_pair_fails() {
        let temp = TempDir::new().unwrap();
        write_pair(temp.path(), "a");
        write_pair(temp.path(), "b");

        let mut ui = MockUI::new();
        let result = KeypairCommand::new(args(temp.path(), "a.crt", "b.pem"))
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("does not belong"));
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = KeypairCommand::new(args(temp.path(), "none.crt", "none.pem"))
            .execute(&mut MockUI::new())
            .unwrap_err();
        assert!(matches!(err, HealthError::KeyLoadFailed { .. }));
    }
}
