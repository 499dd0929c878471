//! Shared report rendering.

use serde::Serialize;

use crate::error::Result;
use crate::report::HealthReport;
use crate::requirements::status::{CheckResult, RequirementLevel};
use crate::ui::UserInterface;

/// Print one check, styled by outcome and level.
pub fn show_check(ui: &mut dyn UserInterface, check: &CheckResult) {
    let text = check.description().render();
    match (check.is_satisfied(), check.level()) {
        (true, _) => ui.success(&text),
        (false, RequirementLevel::Required) => ui.error(&text),
        (false, RequirementLevel::Optional) => ui.warning(&format!("{} (optional)", text)),
    }
}

/// Print the full report for a terminal.
pub fn show_report(ui: &mut dyn UserInterface, report: &HealthReport) {
    let deployment = report.deployment();
    ui.show_header("SimpleSAMLphp installation health");
    ui.show_detail("Version", &deployment.version);
    ui.show_detail("Directory", &deployment.directory);
    ui.show_detail(
        "SAML 2.0 IdP",
        if deployment.saml20_idp { "enabled" } else { "disabled" },
    );

    ui.message("");
    ui.message("Prerequisites:");
    for check in report.prerequisites() {
        show_check(ui, check);
    }

    if !report.warnings().is_empty() {
        ui.message("");
        ui.message("Warnings:");
        for warning in report.warnings() {
            ui.warning(&warning.render());
        }
    }

    ui.message("");
    let failed = report.prerequisites().failures().count();
    if failed == 0 {
        ui.success("All required prerequisites are met");
    } else {
        let noun = if failed == 1 { "prerequisite" } else { "prerequisites" };
        ui.error(&format!("{} required {} not met", failed, noun));
    }
}

/// Print any serializable value as pretty JSON.
pub fn print_json(ui: &mut dyn UserInterface, value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
    ui.message(&json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeploymentConfig;
    use crate::message::Message;
    use crate::report::DeploymentSummary;
    use crate::requirements::status::PrerequisiteMatrix;
    use crate::ui::MockUI;

    #[test]
    fn show_check_uses_correct_ui_method() {
        let mut ui = MockUI::new();
        show_check(&mut ui, &CheckResult::required("ZLib", true));
        show_check(&mut ui, &CheckResult::required("OpenSSL", false));
        show_check(&mut ui, &CheckResult::optional("LDAP extension", false));

        assert!(ui.has_success("ZLib"));
        assert!(ui.has_error("OpenSSL"));
        assert!(ui.has_warning("LDAP extension (optional)"));
    }

    #[test]
    fn show_check_renders_parameters() {
        let mut ui = MockUI::new();
        let descr = Message::with_params(
            "PHP %minimum% or newer is needed. You are running: %current%",
            [("%minimum%", "7.4"), ("%current%", "8.2.7")],
        );
        show_check(&mut ui, &CheckResult::required(descr, true));
        assert!(ui.has_success("PHP 7.4 or newer is needed. You are running: 8.2.7"));
    }

    #[test]
    fn report_shows_header_warnings_and_summary() {
        let mut matrix = PrerequisiteMatrix::new();
        matrix.push(CheckResult::required("JSON support", true));
        matrix.push(CheckResult::required("XML DOM", false));
        let config = DeploymentConfig::new()
            .with("version", "2.1.0")
            .with("enable.saml20-idp", true);
        let report = HealthReport::new(
            DeploymentSummary::from_config(&config),
            matrix,
            vec![Message::plain("Use HTTPS")],
        );

        let mut ui = MockUI::new();
        show_report(&mut ui, &report);

        assert_eq!(ui.detail("Version"), Some("2.1.0"));
        assert_eq!(ui.detail("SAML 2.0 IdP"), Some("enabled"));
        assert!(ui.has_warning("Use HTTPS"));
        assert!(ui.has_error("1 required prerequisite not met"));
    }

    #[test]
    fn print_json_emits_one_document() {
        let mut ui = MockUI::new();
        print_json(&mut ui, &serde_json::json!({"healthy": true})).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(parsed["healthy"], true);
    }
}
