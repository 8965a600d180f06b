use crate::error::SlipmatchError;
use crate::model::DocumentKind;
use crate::parsing::order_id::{has_labeled_order_id, looks_like_order_id};
use crate::parsing::tracking::has_tracking_number;

/// Decide what a document is from the text of its first page.
///
/// A labeled "Order ID:" marks a packing slip. A tracking number, or a bare
/// order-ID list (a label PDF holding only its index page), marks a shipping
/// label.
pub fn classify_document(first_page_text: &str) -> DocumentKind {
    if has_labeled_order_id(first_page_text) {
        DocumentKind::PackingSlip
    } else if has_tracking_number(first_page_text) || looks_like_order_id(first_page_text) {
        DocumentKind::ShippingLabel
    } else {
        DocumentKind::Unknown
    }
}

/// Which of the two received files is the packing slip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRoles {
    /// The first file is the packing slip, the second the shipping label.
    FirstIsSlip,
    /// The second file is the packing slip, the first the shipping label.
    SecondIsSlip,
}

/// Resolve the roles of a pair. Anything but one packing slip plus one
/// shipping label is an anomaly.
pub fn resolve_roles(first: DocumentKind, second: DocumentKind) -> Result<PairRoles, SlipmatchError> {
    match (first, second) {
        (DocumentKind::PackingSlip, DocumentKind::ShippingLabel) => Ok(PairRoles::FirstIsSlip),
        (DocumentKind::ShippingLabel, DocumentKind::PackingSlip) => Ok(PairRoles::SecondIsSlip),
        (a, b) => Err(SlipmatchError::Anomaly(format!(
            "expected one packing slip and one shipping label, got {a} and {b}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_slip() {
        let text = "Ship To:\nJane\nOrder ID: 111-2345678-9012345\nItem  Qty";
        assert_eq!(classify_document(text), DocumentKind::PackingSlip);
    }

    #[test]
    fn test_shipping_label() {
        assert_eq!(
            classify_document("UPS GROUND\nTRK# 1234 5678 9012"),
            DocumentKind::ShippingLabel
        );
        assert_eq!(
            classify_document("Order ID list\n111-2345678-9012345"),
            DocumentKind::ShippingLabel
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify_document("Invoice #42"), DocumentKind::Unknown);
        assert_eq!(classify_document(""), DocumentKind::Unknown);
    }

    #[test]
    fn test_resolve_roles_ignores_arrival_order() {
        assert_eq!(
            resolve_roles(DocumentKind::PackingSlip, DocumentKind::ShippingLabel).unwrap(),
            PairRoles::FirstIsSlip
        );
        assert_eq!(
            resolve_roles(DocumentKind::ShippingLabel, DocumentKind::PackingSlip).unwrap(),
            PairRoles::SecondIsSlip
        );
    }

    #[test]
    fn test_resolve_roles_anomalies() {
        let bad = [
            (DocumentKind::PackingSlip, DocumentKind::PackingSlip),
            (DocumentKind::ShippingLabel, DocumentKind::ShippingLabel),
            (DocumentKind::Unknown, DocumentKind::ShippingLabel),
            (DocumentKind::PackingSlip, DocumentKind::Unknown),
        ];
        for (a, b) in bad {
            assert!(matches!(
                resolve_roles(a, b),
                Err(SlipmatchError::Anomaly(_))
            ));
        }
    }
}
