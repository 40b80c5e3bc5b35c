//! Batch report: per-asset outcomes and terminal formatting.

use std::collections::BTreeMap;
use std::fmt;

use owo_colors::OwoColorize;
use serde::Serialize;

use super::error::AssetFailure;
use crate::catalog::DerivativeSet;

/// Outcome of one batch. Successes are keyed by asset id.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub successes: BTreeMap<String, DerivativeSet>,
    pub failures: Vec<AssetFailure>,
}

impl BatchReport {
    pub fn record(&mut self, asset_id: &str, outcome: Result<DerivativeSet, AssetFailure>) {
        match outcome {
            Ok(set) => {
                self.successes.insert(asset_id.to_string(), set);
            }
            Err(failure) => self.failures.push(failure),
        }
    }

    /// Sort failures by asset id so parallel runs report deterministically.
    pub(super) fn sort(&mut self) {
        self.failures.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.success_count() + self.failure_count()
    }

    pub fn failure(&self, asset_id: &str) -> Option<&AssetFailure> {
        self.failures.iter().find(|f| f.asset_id == asset_id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Print failure records to stderr, grouped by stage.
    pub fn print(&self) {
        if self.failures.is_empty() {
            return;
        }

        let mut by_stage: BTreeMap<&str, Vec<&AssetFailure>> = BTreeMap::new();
        for failure in &self.failures {
            by_stage.entry(failure.stage.name()).or_default().push(failure);
        }

        for (stage, failures) in by_stage {
            eprintln!();
            eprintln!(
                "{} {}",
                stage.red().bold(),
                format!("({} asset{})", failures.len(), plural_s(failures.len())).dimmed()
            );
            for failure in failures {
                eprintln!(
                    "{}{}{} {} {}",
                    "[".dimmed(),
                    failure.asset_id.cyan(),
                    "]".dimmed(),
                    format!("{:?}", failure.kind).yellow(),
                    failure.message
                );
            }
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ok = self.success_count();
        let failed = self.failure_count();

        if self.total() == 0 {
            return write!(f, "{}", "no assets in scope".dimmed());
        }
        write!(
            f,
            "{} {} {}",
            ok.to_string().green().bold(),
            format!("asset{} processed", plural_s(ok)).dimmed(),
            "·".dimmed()
        )?;
        if failed == 0 {
            write!(f, " {}", "no failures".green())
        } else {
            write!(
                f,
                " {} {}",
                failed.to_string().red().bold(),
                format!("failure{}", plural_s(failed)).dimmed()
            )
        }
    }
}

fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
