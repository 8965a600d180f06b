use crate::extraction::PageRange;
use crate::parsing::order_id::looks_like_order_id;
use crate::parsing::strip_noise;
use regex::Regex;
use std::sync::LazyLock;

/// Looser than the order-ID grammar: index text is faint and OCR both drops
/// and invents digits, so each group may be one digit short or long.
static INDEX_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2,4}-\d{6,8}-\d{6,8}").expect("index line pattern is valid")
});

/// Find the trailing run of index pages in a shipping-label document.
///
/// `page_texts[i]` is the OCR text of page `i + 1`. Scans backward from the
/// last page and stops at the first page without an order-ID-shaped string.
/// Returns the 1-based page range of the index pages, or `None` if the last
/// page is not an index page.
pub fn locate_index_pages<S: AsRef<str>>(page_texts: &[S]) -> Option<PageRange> {
    let trailing = page_texts
        .iter()
        .rev()
        .take_while(|text| looks_like_order_id(text.as_ref()))
        .count();

    if trailing == 0 {
        return None;
    }

    let total = page_texts.len();
    Some(total - trailing + 1..=total)
}

/// Read the order-ID candidates off index pages, in page then line order.
///
/// The first non-blank line of every index page is its fixed header and is
/// skipped. Lines without a candidate do not take a position.
pub fn extract_index_lines<S: AsRef<str>>(index_page_texts: &[S]) -> Vec<String> {
    let mut candidates = Vec::new();

    for text in index_page_texts {
        let body = text
            .as_ref()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .skip(1);

        for line in body {
            let compact = strip_noise(line);
            if let Some(m) = INDEX_LINE_RE.find(&compact) {
                candidates.push(m.as_str().to_string());
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(n: usize) -> String {
        format!("UPS GROUND\nTRK# {n}234 5678 9012\nSHIP TO: somebody")
    }

    fn index_page(ids: &[&str]) -> String {
        let mut text = String::from("Order ID list\n");
        for id in ids {
            text.push_str(id);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_locate_returns_last_k_pages() {
        for n in 2..7 {
            for k in 1..n {
                let mut pages: Vec<String> = (1..=n - k).map(label).collect();
                for _ in 0..k {
                    pages.push(index_page(&["111-2345678-9012345"]));
                }
                let range = locate_index_pages(&pages).unwrap();
                assert_eq!(range, n - k + 1..=n, "n={n} k={k}");
            }
        }
    }

    #[test]
    fn test_locate_stops_at_first_label_scanning_backward() {
        // An order-ID-shaped string on an early page is not part of the trailing run.
        let pages = vec![
            index_page(&["111-2345678-9012345"]),
            label(1),
            index_page(&["111-2345678-9012345"]),
        ];
        assert_eq!(locate_index_pages(&pages), Some(3..=3));
    }

    #[test]
    fn test_locate_none_without_index_page() {
        let pages = vec![label(1), label(2)];
        assert_eq!(locate_index_pages(&pages), None);
        assert_eq!(locate_index_pages::<String>(&[]), None);
    }

    #[test]
    fn test_extract_lines_skips_header() {
        let pages = vec![
            "\n\n111-2345678-9012345 header that looks like an id\n222-3456789-0123456\n333-4567890-1234567\n",
        ];
        assert_eq!(
            extract_index_lines(&pages),
            vec!["222-3456789-0123456", "333-4567890-1234567"]
        );
    }

    #[test]
    fn test_extract_lines_across_pages_and_noise() {
        let pages = vec![
            index_page(&["111-2345678-9012 345", "garbled line", "22-3456789-0123456"]),
            index_page(&["333-4567/890-1234567"]),
        ];
        assert_eq!(
            extract_index_lines(&pages),
            vec![
                "111-2345678-9012345",
                "22-3456789-0123456",
                "333-4567890-1234567"
            ]
        );
    }
}
