use crate::model::OrderId;
use crate::parsing::{last_chars, strip_noise};
use regex::Regex;
use std::sync::LazyLock;

/// Order-ID shape as OCR reports it: digit groups of 3, 7 and 7, each digit
/// possibly preceded by stray whitespace.
///
/// Matches e.g. "111-4979156-8561 860" and "112-3331 456-7378648".
pub const ORDER_ID_SHAPE: &str = r"(\s*\d){3}-(\s*\d){7}-(\s*\d){7}";

static ORDER_ID_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ORDER_ID_SHAPE).expect("order-id shape pattern is valid"));

static ORDER_ID_LABELED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)order\s*id:\s*{ORDER_ID_SHAPE}"))
        .expect("labeled order-id pattern is valid")
});

/// Extract the order ID from packing-slip text ("Order ID: 113-2705349-0340212").
///
/// Returns `None` when the page carries no labeled order ID.
pub fn extract_order_id(text: &str) -> Option<OrderId> {
    let m = ORDER_ID_LABELED_RE.find(text)?;
    let compact = strip_noise(m.as_str());
    Some(OrderId::new(last_chars(&compact, OrderId::LEN)))
}

/// True if the text contains a labeled order ID, the mark of a packing slip.
pub fn has_labeled_order_id(text: &str) -> bool {
    ORDER_ID_LABELED_RE.is_match(text)
}

/// True if the text contains anything shaped like an order ID, labeled or not.
pub fn looks_like_order_id(text: &str) -> bool {
    ORDER_ID_SHAPE_RE.is_match(text)
}
