pub mod index;
pub mod order_id;
pub mod tracking;

pub use index::{extract_index_lines, locate_index_pages};
pub use order_id::{extract_order_id, looks_like_order_id};
pub use tracking::{extract_tracking_number, TrackingGrammar, TRACKING_GRAMMARS};

/// Remove everything OCR tends to sprinkle inside identifiers: whitespace and slashes.
pub fn strip_noise(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '/')
        .collect()
}

/// Keep the last `n` characters of `s`.
pub(crate) fn last_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let start = s
        .char_indices()
        .nth(count - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_noise() {
        assert_eq!(strip_noise(" 111-49 79156-8561/860\n"), "111-4979156-8561860");
    }

    #[test]
    fn test_last_chars() {
        assert_eq!(last_chars("TRK#123456789012", 12), "123456789012");
        assert_eq!(last_chars("abc", 12), "abc");
    }
}
