use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for walks whose entry count is not known up front.
pub fn create_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {elapsed_precise} {pos} entries - {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Prints a framed summary to stderr.
pub fn print_box(title: &str, lines: &[String], color: &str) {
    const RESET: &str = "\x1b[0m";

    let title_width = title.chars().count();
    let inner = lines
        .iter()
        .map(|l| l.chars().count())
        .chain([title_width + 2])
        .max()
        .unwrap_or(0)
        + 2;

    let rule = "─".repeat(inner - title_width - 3);
    eprintln!("{color}┌─ {title} {rule}┐{RESET}");
    for line in lines {
        let pad = inner - line.chars().count() - 1;
        eprintln!("{color}│{RESET} {line}{:pad$}{color}│{RESET}", "");
    }
    eprintln!("{color}└{}┘{RESET}", "─".repeat(inner));
}
