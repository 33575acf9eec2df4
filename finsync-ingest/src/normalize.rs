//! Line cleanup for OCR output.
//!
//! Screenshot recognition tends to prefix lines with icon fragments ("pe",
//! "Q", "=>", stray punctuation). These are removed before any parser sees
//! the line, leaving sign and currency markers alone.

/// Artifacts that only count as noise when followed by whitespace
const NOISE_TOKENS: &[&str] = &["pe", "i", "q", "&", "—", "oo", "fu]", "=>"];

/// Clean a single line: drop a leading noise token, then any leading
/// characters other than letters, digits, `+`, `-` and `$`.
pub fn clean_line(line: &str) -> String {
    let s = strip_noise_token(line.trim_start());
    s.trim_start_matches(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '-' | '$')))
        .trim()
        .to_string()
}

/// Split text into cleaned, non-empty lines
pub fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .collect()
}

fn strip_noise_token(line: &str) -> &str {
    for token in NOISE_TOKENS {
        let Some(head) = line.get(..token.len()) else {
            continue;
        };
        if head.to_lowercase() != *token {
            continue;
        }
        let rest = &line[token.len()..];
        if rest.starts_with(char::is_whitespace) {
            return rest.trim_start();
        }
    }
    line
}
