use owo_colors::OwoColorize;

use crate::VERSION;
use crossfeed_core::{Card, CardSource};

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Crossfeed".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Format feed entries for social silos\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print a labelled value under the current step
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print card details summary
pub fn print_card_details(card: &Card, limit: Option<usize>) {
    let source = match card.provenance {
        CardSource::Card => "page meta tags",
        CardSource::BestText => "entry markup",
    };
    let length = card.text.chars().count();
    let length = match limit.filter(|l| *l > 0) {
        Some(limit) => format!("{} / {}", length, limit),
        None => length.to_string(),
    };

    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Card Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    print_detail("Source", source);
    print_detail("Length", &length);
    if let Some(image) = &card.image {
        print_detail("Image", image);
    }
    if !card.url_spans.is_empty() {
        print_detail("Link spans", &card.url_spans.len().to_string());
    }
    eprintln!();
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
