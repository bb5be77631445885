// Run reporting: per-section success/failure tallies and the final
// summary block. Failures keep a capped list of details so a batch of
// 150 identical 400s prints five useful lines, not 150.

use colored::Colorize;

/// How many failure details each section keeps for the report.
pub const FAILURE_DETAIL_CAP: usize = 5;

/// One kept failure: where it happened and what the instance said.
#[derive(Debug, Clone)]
pub struct Failure {
    /// 1-based position in the batch.
    pub index: usize,
    /// External reference code, when the record got far enough to have one.
    pub reference: Option<String>,
    pub detail: String,
}

impl Failure {
    fn render(&self) -> String {
        match &self.reference {
            Some(code) => format!("record {} ({}): {}", self.index, code, self.detail),
            None => format!("record {}: {}", self.index, self.detail),
        }
    }
}

/// Success/failure counts for one section of a run (one dataset, one
/// picklist pass, one set of object definitions).
#[derive(Debug, Clone)]
pub struct Tally {
    label: String,
    succeeded: usize,
    failed: usize,
    kept: Vec<Failure>,
}

impl Tally {
    pub fn new(label: impl Into<String>) -> Self {
        Tally {
            label: label.into(),
            succeeded: 0,
            failed: 0,
            kept: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Count a failure. Returns true while the detail was kept, so the
    /// caller can echo kept failures inline and stay quiet afterwards.
    pub fn record_failure(
        &mut self,
        index: usize,
        reference: Option<String>,
        detail: String,
    ) -> bool {
        self.failed += 1;
        if self.kept.len() < FAILURE_DETAIL_CAP {
            self.kept.push(Failure {
                index,
                reference,
                detail,
            });
            true
        } else {
            false
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Percentage of attempts that succeeded. An empty section counts as
    /// fully successful so it never drags a summary down.
    pub fn success_rate(&self) -> f64 {
        if self.attempted() == 0 {
            100.0
        } else {
            self.succeeded as f64 * 100.0 / self.attempted() as f64
        }
    }

    pub fn failures(&self) -> &[Failure] {
        &self.kept
    }

    /// Section block: one status line plus the kept failure details.
    pub fn print(&self) {
        let counts = format!("{}/{}", self.succeeded, self.attempted());
        let line = format!(
            "{}: {} uploaded ({:.1}%)",
            self.label,
            counts,
            self.success_rate()
        );
        if self.all_succeeded() {
            println!("{} {}", "OK".green().bold(), line);
        } else {
            println!("{} {}", "FAIL".red().bold(), line);
            for failure in &self.kept {
                println!("    {}", failure.render());
            }
            let unprinted = self.failed - self.kept.len();
            if unprinted > 0 {
                println!("    ... and {unprinted} more");
            }
        }
    }
}

/// The whole run: one tally per section plus grand totals. The exit code
/// of the process comes from here.
#[derive(Debug, Default)]
pub struct RunReport {
    sections: Vec<Tally>,
}

impl RunReport {
    pub fn new() -> Self {
        RunReport::default()
    }

    pub fn push(&mut self, tally: Tally) {
        self.sections.push(tally);
    }

    pub fn sections(&self) -> &[Tally] {
        &self.sections
    }

    pub fn total_succeeded(&self) -> usize {
        self.sections.iter().map(Tally::succeeded).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.sections.iter().map(Tally::failed).sum()
    }

    pub fn total_attempted(&self) -> usize {
        self.total_succeeded() + self.total_failed()
    }

    pub fn all_succeeded(&self) -> bool {
        self.total_failed() == 0
    }

    /// 0 when every section was clean, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    pub fn print_summary(&self) {
        println!();
        println!("{}", "-".repeat(60));
        println!("{}", "SUMMARY".bold());
        for tally in &self.sections {
            let counts = format!("{}/{}", tally.succeeded(), tally.attempted());
            let counts = if tally.all_succeeded() {
                counts.green()
            } else {
                counts.red()
            };
            println!("  {:<22} {}", tally.label(), counts);
        }
        let rate = if self.total_attempted() == 0 {
            100.0
        } else {
            self.total_succeeded() as f64 * 100.0 / self.total_attempted() as f64
        };
        println!(
            "Total: {}/{} succeeded ({:.1}%)",
            self.total_succeeded(),
            self.total_attempted(),
            rate
        );
        println!("{}", "-".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_rate() {
        let mut tally = Tally::new("loans");
        for _ in 0..48 {
            tally.record_success();
        }
        tally.record_failure(12, Some("LN-2025-1011".into()), "HTTP 400: bad field".into());
        tally.record_failure(30, None, "network error: reset".into());
        assert_eq!(tally.succeeded(), 48);
        assert_eq!(tally.failed(), 2);
        assert_eq!(tally.attempted(), 50);
        assert!((tally.success_rate() - 96.0).abs() < 1e-9);
        assert!(!tally.all_succeeded());
    }

    #[test]
    fn keeps_at_most_five_failure_details() {
        let mut tally = Tally::new("deals");
        for i in 0..9 {
            let kept = tally.record_failure(i + 1, None, format!("HTTP 500: boom {i}"));
            assert_eq!(kept, i < FAILURE_DETAIL_CAP);
        }
        assert_eq!(tally.failed(), 9);
        assert_eq!(tally.failures().len(), FAILURE_DETAIL_CAP);
        assert_eq!(tally.failures()[0].index, 1);
        assert_eq!(tally.failures()[4].index, 5);
    }

    #[test]
    fn empty_tally_counts_as_clean() {
        let tally = Tally::new("clients");
        assert!(tally.all_succeeded());
        assert!((tally.success_rate() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn report_exit_code_reflects_any_failure() {
        let mut report = RunReport::new();
        let mut ok = Tally::new("clients");
        ok.record_success();
        report.push(ok);
        assert_eq!(report.exit_code(), 0);

        let mut bad = Tally::new("loans");
        bad.record_success();
        bad.record_failure(2, None, "HTTP 503: busy".into());
        report.push(bad);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.total_succeeded(), 2);
        assert_eq!(report.total_failed(), 1);
        assert!(!report.all_succeeded());
    }
}
