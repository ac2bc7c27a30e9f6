//! Formatting for durations, source locations and the develop banner.

use console::Term;
use kiln_core::DevelopUrls;
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;

/// Format a duration with the most readable unit.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Format `file:line:column`, leaving out whatever is unknown.
pub fn format_location(file: Option<&Path>, line: Option<u32>, column: Option<u32>) -> Option<String> {
    let file = file?.display().to_string();
    Some(match (line, column) {
        (Some(line), Some(column)) => format!("{}:{}:{}", file, line, column),
        (Some(line), None) => format!("{}:{}", file, line),
        _ => file,
    })
}

/// Lines of the banner shown once the first build succeeded.
pub fn onboarding_lines(site: &str, urls: &DevelopUrls) -> Vec<String> {
    let mut lines = vec![
        format!("You can now view {} in the browser.", site),
        String::new(),
        format!("  Local:            {}", urls.local_for_terminal),
    ];
    if let Some(lan) = &urls.lan_for_terminal {
        lines.push(format!("  On Your Network:  {}", lan));
    }
    lines.push(String::new());
    lines.push("Note that the development build is not optimized.".to_string());
    lines
}

/// Print the develop banner to stderr.
pub fn print_onboarding(site: &str, urls: &DevelopUrls) {
    let width = (Term::stderr().size().1 as usize).min(80);

    eprintln!();
    for line in onboarding_lines(site, urls) {
        if line.trim_start().starts_with("Local:") || line.trim_start().starts_with("On Your") {
            eprintln!("{}", line.bold());
        } else {
            eprintln!("{}", line);
        }
    }
    eprintln!("{}", "─".repeat(width).dimmed());
}
