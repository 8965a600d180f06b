use crate::error::SlipmatchError;
use crate::model::{OrderId, OrderRecord, Page, TrackingNumber};
use std::collections::{BTreeMap, HashMap};

/// Page number <-> order ID, built once per document and injective both ways.
#[derive(Debug, Default)]
pub struct OrderIndex {
    by_page: BTreeMap<usize, OrderId>,
    by_order: HashMap<OrderId, usize>,
}

impl OrderIndex {
    /// Build the index, rejecting an order ID that appears on two pages.
    pub fn build(
        entries: impl IntoIterator<Item = (usize, OrderId)>,
    ) -> Result<Self, SlipmatchError> {
        let mut index = OrderIndex::default();
        for (page, order_id) in entries {
            if let Some(&first_page) = index.by_order.get(&order_id) {
                return Err(SlipmatchError::DuplicateOrderId {
                    order_id: order_id.to_string(),
                    first_page,
                    second_page: page,
                });
            }
            index.by_order.insert(order_id.clone(), page);
            index.by_page.insert(page, order_id);
        }
        Ok(index)
    }

    pub fn page_of(&self, order_id: &OrderId) -> Option<usize> {
        self.by_order.get(order_id).copied()
    }

    /// Entries in ascending page order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &OrderId)> {
        self.by_page.iter().map(|(page, id)| (*page, id))
    }

    pub fn len(&self) -> usize {
        self.by_page.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_page.is_empty()
    }
}

/// A packing-slip page with its order ID.
#[derive(Debug, Clone)]
pub struct SlipPage {
    pub page: Page,
    pub order_id: OrderId,
}

/// A shipping-label page with the order ID voted from the index pages and
/// the tracking number read off the label itself.
#[derive(Debug, Clone)]
pub struct LabelPage {
    pub page: Page,
    pub order_id: OrderId,
    pub tracking_number: TrackingNumber,
}

/// Join packing slips to shipping labels by order ID.
///
/// Both sides must hold the same set of order IDs, each exactly once.
/// Records come back in ascending packing-slip page order.
pub fn match_orders(
    slips: &[SlipPage],
    labels: &[LabelPage],
) -> Result<Vec<OrderRecord>, SlipmatchError> {
    let slip_index = OrderIndex::build(
        slips
            .iter()
            .map(|s| (s.page.page_number, s.order_id.clone())),
    )?;
    let label_index = OrderIndex::build(
        labels
            .iter()
            .map(|l| (l.page.page_number, l.order_id.clone())),
    )?;

    if slip_index.is_empty() {
        return Err(SlipmatchError::Join("no packing slips to match".into()));
    }
    if slip_index.len() != label_index.len() {
        return Err(SlipmatchError::Join(format!(
            "{} packing slip(s) but {} shipping label(s)",
            slip_index.len(),
            label_index.len()
        )));
    }

    let slips_by_page: HashMap<usize, &SlipPage> =
        slips.iter().map(|s| (s.page.page_number, s)).collect();
    let labels_by_page: HashMap<usize, &LabelPage> =
        labels.iter().map(|l| (l.page.page_number, l)).collect();

    let mut records = Vec::with_capacity(slips.len());
    for (ps_page, order_id) in slip_index.iter() {
        let sl_page = label_index.page_of(order_id).ok_or_else(|| {
            SlipmatchError::Join(format!(
                "order {} on packing slip page {} has no shipping label",
                order_id, ps_page
            ))
        })?;

        let slip = slips_by_page[&ps_page];
        let label = labels_by_page[&sl_page];

        tracing::debug!(%order_id, ps_page, sl_page, tracking = %label.tracking_number, "matched order");

        records.push(OrderRecord {
            order_id: order_id.clone(),
            tracking_number: label.tracking_number.clone(),
            ps_page: slip.page.clone(),
            sl_page: label.page.clone(),
        });
    }

    Ok(records)
}
