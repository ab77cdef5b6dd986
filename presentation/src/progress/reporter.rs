//! Progress reporting for plan execution

use cadmate_application::PipelineProgress;
use cadmate_domain::agent::plan::PlanStep;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports plan execution progress with a progress bar
pub struct ProgressReporter {
    multi: MultiProgress,
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-")
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgress for ProgressReporter {
    fn on_step_started(&self, step: &PlanStep, total: usize) {
        let mut guard = self.bar.lock().unwrap();
        let pb = guard.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            pb.set_prefix("Executing");
            pb
        });
        pb.set_message(format!("step {}: {}", step.order, step.description));
    }

    fn on_step_finished(&self, step: &PlanStep, success: bool) {
        let mut guard = self.bar.lock().unwrap();
        let Some(pb) = guard.as_ref() else {
            return;
        };
        pb.inc(1);
        if !success {
            pb.abandon_with_message(format!(
                "{} step {} failed",
                "x".red(),
                step.order
            ));
            *guard = None;
        } else if pb.position() >= pb.length().unwrap_or(0) {
            pb.finish_with_message("done".green().to_string());
            *guard = None;
        } else {
            pb.set_message(format!("{} step {}", "v".green(), step.order));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl PipelineProgress for SimpleProgress {
    fn on_step_started(&self, step: &PlanStep, total: usize) {
        println!(
            "{} step {}/{}: {}",
            "->".cyan(),
            step.order,
            total,
            step.description
        );
    }

    fn on_step_finished(&self, step: &PlanStep, success: bool) {
        if success {
            println!("  {} step {}", "v".green(), step.order);
        } else {
            println!("  {} step {} (failed)", "x".red(), step.order);
        }
    }
}
