//! Common helper functions for Convene.

use std::time::Duration;

/// Redacts a secret for logging, keeping only the last four characters.
pub fn redact_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 4 {
        return "***".to_string();
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("***{tail}")
}

/// Formats an elapsed duration as `MM:SS`, or `H:MM:SS` once it reaches an hour.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Uppercase initials of each whitespace-separated word in a display name.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
