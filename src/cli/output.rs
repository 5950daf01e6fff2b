//! CLI output formatting utilities.

use crate::edl::Edl;
use crate::health::{HealthReport, HealthStatus};
use crate::supervisor::ToolResult;
use crate::workflow::WorkflowResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Summarize a tool result.
    pub fn tool_result(result: &ToolResult) {
        let tier = result
            .quality_tier_used
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let summary = format!(
            "{} ({} attempts, {} degradations, tier {}, {})",
            style(&result.tool).bold(),
            result.attempts,
            result.degradations,
            tier,
            format_millis(result.execution_time.as_secs_f64() * 1000.0)
        );

        match &result.error {
            None => Self::success(&summary),
            Some(err) => {
                Self::error(&summary);
                Self::kv("error", &err.to_string());
            }
        }
    }

    /// Summarize a workflow run step by step.
    pub fn workflow_result(result: &WorkflowResult) {
        Self::header(&format!("Workflow {}", result.workflow));
        for step in &result.steps {
            print!("  {}. ", step.index + 1);
            Self::tool_result(&step.result);
        }
        match result.error() {
            None => Self::success(&format!(
                "Completed {} steps{}",
                result.steps.len(),
                if result.dry_run { " (dry run)" } else { "" }
            )),
            Some(err) => Self::error(&format!("Workflow failed: {}", err)),
        }
    }

    /// Print the clips of an EDL.
    pub fn edl(edl: &Edl) {
        Self::header(&format!("Selected {} clips", edl.clips.len()));
        for clip in &edl.clips {
            println!(
                "  {} {} - {} ({:.1}s, score {:.1}) {}",
                style("*").cyan(),
                style(format_timestamp(clip.start)).cyan(),
                style(format_timestamp(clip.end)).cyan(),
                clip.duration,
                clip.score,
                content_preview(&clip.text, 80)
            );
        }
        println!();
        Self::kv("Total duration", &format!("{:.1}s", edl.total_duration()));
        Self::kv("Segments considered", &edl.metadata.segments_considered.to_string());
    }

    /// Print a health report.
    pub fn health(report: &HealthReport) {
        let status = match report.status {
            HealthStatus::Healthy => style(report.status.to_string()).green().bold(),
            HealthStatus::Warning => style(report.status.to_string()).yellow().bold(),
            HealthStatus::Critical => style(report.status.to_string()).red().bold(),
        };
        println!("{} {}", style("Status:").bold(), status);

        Self::header("Resources");
        Self::kv("CPU", &format!("{:.1}%", report.resources.cpu_percent));
        Self::kv("Memory", &format!("{:.1}%", report.resources.memory_percent));
        Self::kv("Disk", &format!("{:.1}%", report.resources.disk_percent));

        if !report.tool_failure_rates.is_empty() {
            Self::header("Tool failure rates");
            for (tool, rate) in &report.tool_failure_rates {
                Self::kv(tool, &format!("{:.0}%", rate * 100.0));
            }
        }

        for reason in &report.reasons {
            Self::warning(reason);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format seconds as `m:ss` or `h:mm:ss`.
fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

fn format_millis(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        format!("{:.0}ms", ms)
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(8.4), "0:08");
        assert_eq!(format_timestamp(754.0), "12:34");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
    }

    #[test]
    fn test_content_preview_is_char_safe() {
        assert_eq!(content_preview("hej då", 10), "hej då");
        assert_eq!(content_preview("ååååå", 2), "åå...");
    }
}
