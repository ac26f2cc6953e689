//! Output formatting for CLI

use reel_core::{Quality, SessionSnapshot};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(data: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Print the session state
pub fn print_snapshot(snapshot: &SessionSnapshot, format: &str) {
    if OutputFormat::from(format) == OutputFormat::Json {
        print_json(snapshot);
        return;
    }

    println!("\nSession:");
    println!("  Phase: {}", snapshot.phase);
    if let Some(title) = &snapshot.title {
        println!("  Title: {}", title);
    }
    if let Some(url) = &snapshot.stream_url {
        println!("  Stream: {}", url);
    }
    if let Some(duration) = snapshot.duration {
        println!("  Duration: {}", format_clock(duration));
    }
    println!("  Resume at: {}", format_clock(snapshot.resume_position));
    if let Some(quality) = &snapshot.current_quality {
        println!("  Quality: {}", quality);
    }
    if let Some(error) = &snapshot.error {
        println!("  Error: {}", error);
    }
}

/// Print a quality catalog
pub fn print_qualities(qualities: &[Quality], format: &str) {
    if OutputFormat::from(format) == OutputFormat::Json {
        print_json(&qualities);
        return;
    }

    println!("\nQualities:");
    for (i, q) in qualities.iter().enumerate() {
        println!(
            "  {}. {} {} {}",
            i + 1,
            q.quality,
            q.resolution.as_deref().unwrap_or("-"),
            q.file_size.as_deref().unwrap_or("")
        );
    }
}

/// Format seconds as H:MM:SS
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
