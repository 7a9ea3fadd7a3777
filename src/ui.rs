//! Terminal output: a progress bar over the job's techniques and a coloured
//! verdict once it finishes.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state_machine::{CancelReason, JobStatus};
use crate::strength::StrengthRating;
use crate::technique::TechniqueKind;
use crate::view::{ProgressView, ResultView, SlotStatus};

/// Follows one job in the terminal.
///
/// The bar counts resolved techniques; each slot that resolves is printed
/// once above it.
pub struct JobProgress {
    pb: ProgressBar,
    reported: Vec<TechniqueKind>,
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl JobProgress {
    pub fn start(hash: &str, total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(format!("cracking {}", short_hash(hash)));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            reported: Vec::new(),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }

    /// Moves the bar to `progress` and prints newly resolved techniques.
    pub fn update(&mut self, progress: &ProgressView) {
        self.pb.set_length(progress.total_techniques as u64);
        self.pb.set_position(progress.completed_techniques as u64);

        for (kind, status) in &progress.results {
            if *status == SlotStatus::Pending || self.reported.contains(kind) {
                continue;
            }
            self.reported.push(*kind);
            let marker = match status {
                SlotStatus::Cracked => self.green.apply_to("✓"),
                SlotStatus::Faulted => self.red.apply_to("✗"),
                SlotStatus::TimedOut => self.yellow.apply_to("⏱"),
                _ => self.dim.apply_to("·"),
            };
            self.pb.println(format!("  {marker} {kind}: {}", status.label()));
        }
    }

    /// Clears the bar and prints the verdict.
    pub fn complete(&self, result: &ResultView) {
        self.pb.finish_and_clear();

        match (&result.password, result.cracked_by) {
            (Some(password), Some(kind)) => println!(
                "  {} Cracked by {kind}: {}",
                self.green.apply_to("✓"),
                self.green.apply_to(password)
            ),
            _ => {
                let reason = match result.status {
                    JobStatus::Cancelled(CancelReason::Timeout) => "time budget exhausted",
                    JobStatus::Cancelled(CancelReason::Requested) => "cancelled",
                    _ => "no technique found the password",
                };
                println!("  {} Not cracked: {reason}", self.red.apply_to("✗"));
            }
        }

        println!("  Time taken: {:.2}s", result.time_taken);
        if let Some(rating) = result.strength_rating {
            let style = match rating {
                StrengthRating::Weak => &self.red,
                StrengthRating::Medium => &self.yellow,
                StrengthRating::Strong => &self.green,
            };
            println!("  Strength:   {}", style.apply_to(rating));
        }
    }
}

pub fn print_json(result: &ResultView) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

/// One line per technique with its enabled state.
pub fn print_techniques(toggles: &[(TechniqueKind, bool)]) {
    let green = Style::new().green();
    let dim = Style::new().dim();
    for (kind, enabled) in toggles {
        if *enabled {
            println!("  {} {kind}", green.apply_to("on "));
        } else {
            println!("  {} {kind}", dim.apply_to("off"));
        }
    }
}
