//! Terminal output: status lines, formatting and the develop banner.
//!
//! ```no_run
//! use kiln_cli::ui;
//!
//! ui::init_colors(false);
//! ui::info("Starting develop server...");
//! ui::success("Built in 120ms");
//! ```

mod format;
mod messages;

pub use format::{format_duration, format_location, onboarding_lines, print_onboarding};
pub use messages::{error, info, success, warning};

/// Check if stderr output should be colored.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise stderr must be attended.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Apply the color decision globally. `--no-color` always wins.
pub fn init_colors(no_color: bool) {
    owo_colors::set_override(!no_color && should_use_color());
}
