use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").unwrap();
}

/// Truncate text to fit within the overlay's character budget.
///
/// Words are accumulated while the running length stays under 60 characters,
/// so the result is always shorter than the budget and already-short input
/// passes through unchanged. The budget counts characters, not bytes, so
/// non-ASCII titles are not truncated early.
pub fn clear(text: &str) -> String {
    let mut title = String::new();
    let mut title_chars = 0;
    for word in text.split(' ') {
        let word_chars = word.chars().count();
        if title_chars + word_chars < 60 {
            title.push(' ');
            title.push_str(word);
            title_chars += word_chars + 1;
        }
    }
    title.trim().to_string()
}

/// Collapse runs of non-word characters into single spaces and title-case
/// the result.
pub fn sanitize_title(raw: &str) -> String {
    title_case(&NON_WORD.replace_all(raw, " "))
}

/// Take at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// Uppercase the first letter of each alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
