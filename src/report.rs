//! Human-readable transcript and the final summary.
//!
//! The transcript is the product of this tool: ordered per-role sections,
//! one line per case, and a fixed-format closing block. Diagnostics go
//! through `tracing`; everything here writes to stdout.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::classify::{Classification, Expectation};
use crate::identity::IdentityContext;
use crate::suite::{RoleReport, Verdict};

const RULE_WIDTH: usize = 80;
const STATEMENT_PREVIEW: usize = 100;

/// Aggregate of all role reports, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub started_at: DateTime<Utc>,
    pub reports: Vec<RoleReport>,
}

impl Summary {
    pub fn total_cases(&self) -> usize {
        self.reports.iter().map(|r| r.verdicts.len()).sum()
    }

    pub fn passed(&self) -> usize {
        self.reports.iter().map(|r| r.passed()).sum()
    }

    pub fn unexpected_failures(&self) -> usize {
        self.reports.iter().map(|r| r.unexpected_failures()).sum()
    }

    pub fn unexpected_successes(&self) -> usize {
        self.reports.iter().map(|r| r.unexpected_successes()).sum()
    }

    pub fn suites_with_errors(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.suite_error.is_some())
            .count()
    }

    pub fn has_anomalies(&self) -> bool {
        self.unexpected_failures() > 0
            || self.unexpected_successes() > 0
            || self.suites_with_errors() > 0
    }
}

/// Opening banner, printed before fixtures are applied.
pub fn print_banner(started_at: DateTime<Utc>) {
    println!("{}", "═".repeat(RULE_WIDTH));
    println!("{}", "RLS ROLE VERIFICATION".cyan().bold());
    println!("Started: {}", started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("{}", "═".repeat(RULE_WIDTH));
}

/// Render the whole transcript: one section per role, then the summary
/// block.
pub fn render(summary: &Summary) {
    for report in &summary.reports {
        render_role(report);
    }
    render_summary_block(summary);
}

fn render_role(report: &RoleReport) {
    print_role_header(&report.identity);

    if let Some(error) = &report.suite_error {
        println!(
            "{} {} — no cases were run",
            "SUITE ERROR:".red().bold(),
            error
        );
        return;
    }

    for verdict in &report.verdicts {
        render_verdict(verdict);
    }
}

fn print_role_header(identity: &IdentityContext) {
    println!("\n{}", "═".repeat(RULE_WIDTH));
    println!("{} {}", "TESTING ROLE:".cyan().bold(), identity.role);
    if let Some(branch) = &identity.branch_id {
        println!("   Branch: {}", branch);
    }
    if let Some(user) = &identity.user_id {
        println!("   User ID: {}", user);
    }
    println!("{}", "═".repeat(RULE_WIDTH));
}

fn render_verdict(verdict: &Verdict) {
    println!("\n{} {}", "Test:".blue(), verdict.case.name);
    println!(
        "   Query: {}",
        preview(&verdict.case.statement, STATEMENT_PREVIEW).dimmed()
    );

    match verdict.classification {
        Classification::Pass => match verdict.case.expectation {
            Expectation::Success => {
                let detail = verdict
                    .outcome
                    .scalar_count()
                    .map(|n| format!(" (count: {})", n))
                    .unwrap_or_default();
                println!(
                    "   {} — statement executed{}",
                    "PASS".green().bold(),
                    detail
                );
            }
            Expectation::Fail => {
                let failure = verdict
                    .outcome
                    .failure
                    .as_ref()
                    .map(|f| format!("{}: {}", f.kind, preview(&f.message, STATEMENT_PREVIEW)))
                    .unwrap_or_else(|| "blocked".to_string());
                println!(
                    "   {} — statement correctly blocked ({})",
                    "PASS".green().bold(),
                    failure
                );
            }
            Expectation::Value => {
                let payload = verdict
                    .outcome
                    .payload
                    .as_ref()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "no rows".to_string());
                println!("   {} — result: {}", "PASS".green().bold(), payload);
            }
        },
        Classification::UnexpectedFail => {
            let failure = verdict
                .outcome
                .failure
                .as_ref()
                .map(|f| format!("{}: {}", f.kind, preview(&f.message, STATEMENT_PREVIEW)))
                .unwrap_or_else(|| "unknown failure".to_string());
            println!("   {} — {}", "UNEXPECTED FAIL".red().bold(), failure);
        }
        Classification::UnexpectedSuccess => {
            println!(
                "   {} — statement should have been blocked but succeeded",
                "UNEXPECTED SUCCESS".red().bold()
            );
        }
    }
}

fn render_summary_block(summary: &Summary) {
    println!("\n{}", "═".repeat(RULE_WIDTH));
    println!("{}", "SUMMARY".cyan().bold());
    println!("{}", "═".repeat(RULE_WIDTH));
    println!("Cases:                {}", summary.total_cases());
    println!(
        "Passed:               {}",
        summary.passed().to_string().green()
    );
    println!(
        "Unexpected failures:  {}",
        colorize_count(summary.unexpected_failures())
    );
    println!(
        "Unexpected successes: {}",
        colorize_count(summary.unexpected_successes())
    );
    if summary.suites_with_errors() > 0 {
        println!(
            "Suites with errors:   {}",
            summary.suites_with_errors().to_string().red()
        );
    }

    println!();
    for report in &summary.reports {
        println!(
            "  {} — {}/{} passed — {}",
            report.role,
            report.passed(),
            report.verdicts.len(),
            report.role.capability_summary()
        );
    }

    println!();
    if summary.has_anomalies() {
        println!("{}", "Policy anomalies detected — review above.".red().bold());
    } else {
        println!("{}", "All policies behaved as declared.".green().bold());
    }
}

fn colorize_count(count: usize) -> String {
    if count > 0 {
        count.to_string().red().to_string()
    } else {
        count.to_string()
    }
}

/// Flatten and truncate a statement for one-line display.
fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max {
        let head: String = flat.chars().take(max).collect();
        format!("{}...", head)
    } else {
        flat
    }
}
