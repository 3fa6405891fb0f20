use colored::Colorize;
use wpcorrelate_core::{AnalysisReport, LineAnalysisResult, VulnerabilityRecord};

pub fn emit(report: &AnalysisReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", print_json(report)?);
    } else {
        print_report(report);
    }
    Ok(())
}

pub fn print_report(report: &AnalysisReport) {
    let summary = report.summary();

    println!("\n{}", "=".repeat(60));
    println!("{}", "WordPress Vulnerability Report".bold());
    println!("{}", "=".repeat(60));
    if report.code != 0 {
        println!("Scanner exit code: {}", report.code.to_string().yellow());
    }
    println!();

    println!("Summary:");
    println!("  Plugins detected: {}", summary.plugins_detected);
    println!("  Known vulnerabilities: {}", summary.vulnerabilities_found);
    println!(
        "  Applicable vulnerabilities: {}",
        summary.applicable_vulnerabilities
    );
    println!("  With nuclei template: {}", summary.templates_available);
    if summary.api_errors > 0 {
        println!("  API errors: {}", summary.api_errors.to_string().red());
    }
    if summary.processing_errors > 0 {
        println!(
            "  Processing errors: {}",
            summary.processing_errors.to_string().red()
        );
    }
    println!();

    for result in &report.analysis_results {
        print_result(result);
    }

    if report.code == -1 && !report.error_output.is_empty() {
        println!("{}", report.error_output.red());
    }

    if report.has_applicable_vulnerabilities() {
        println!("{}", "Applicable vulnerabilities found!".red().bold());
    } else if !report.analysis_results.is_empty() {
        println!("{}", "No applicable vulnerabilities.".green());
    }
}

fn print_result(result: &LineAnalysisResult) {
    println!("{} {}", result.plugin_slug.bold(), result.detected_version);

    if let Some(error) = &result.processing_error {
        println!("  {}", error.red());
    }
    if let Some(error) = &result.api_error {
        println!("  {} {}", "API:".red(), error);
    }

    for applicable in &result.applicable_vulnerabilities {
        let vuln = &applicable.vulnerability;
        println!("  - [{}] {} ({})", vuln.id, vuln.name, affected_range(vuln));

        if let Some(cve) = vuln.first_cve() {
            let template = match &applicable.template {
                Some(t) if t.available == Some(true) => "template available".green(),
                Some(t) if t.available == Some(false) => "no template".normal(),
                Some(t) => t.error.as_deref().unwrap_or("unknown").yellow(),
                None => "not checked".dimmed(),
            };
            println!("    {}: {}", cve, template);
        }
    }
    println!();
}

// Wording follows the published `max_operator`.
fn affected_range(vuln: &VulnerabilityRecord) -> String {
    let Some(max) = vuln.max_version() else {
        return "affected range unknown".to_string();
    };
    match vuln.version_range.max_operator.as_deref() {
        Some("le") => format!("affected up to {}", max),
        Some(op) if op != "lt" => format!("affected {} {}", op, max),
        _ => format!("affected below {}", max),
    }
}

pub fn print_json(report: &AnalysisReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
