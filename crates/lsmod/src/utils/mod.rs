use colored::{ColoredString, Colorize};
use lsmod_order::Severity;

pub mod config;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Human readable byte count, e.g. `1.5 KiB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Colored label for a warning severity.
pub fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "critical".bright_red().bold(),
        Severity::Warning => "warning".bright_yellow().bold(),
        Severity::Info => "info".bright_cyan(),
    }
}
