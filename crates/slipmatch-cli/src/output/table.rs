use slipmatch_core::error::SlipmatchError;
use slipmatch_core::model::OrderRecord;
use slipmatch_core::pipeline::OrderSink;

pub fn format_records(records: &[OrderRecord]) -> String {
    if records.is_empty() {
        return "No orders matched.\n".to_string();
    }

    let tracking_width = records
        .iter()
        .map(|r| r.tracking_number.value.len())
        .max()
        .unwrap_or(0)
        .max("Tracking".len());

    let mut out = String::new();
    out.push_str(&format!(
        "{:<19}  {:<tw$}  {:<6}  {:>7}  {:>7}\n",
        "Order ID",
        "Tracking",
        "Format",
        "PS page",
        "SL page",
        tw = tracking_width
    ));
    out.push_str(&format!("{}\n", "-".repeat(19 + tracking_width + 6 + 7 + 7 + 8)));

    for r in records {
        out.push_str(&format!(
            "{:<19}  {:<tw$}  {:<6}  {:>7}  {:>7}\n",
            r.order_id.as_str(),
            r.tracking_number.value,
            r.tracking_number.format.to_string(),
            r.ps_page.page_number,
            r.sl_page.page_number,
            tw = tracking_width
        ));
    }

    out
}

/// Prints each job as a table, numbered from the start of the session.
#[derive(Default)]
pub struct TableSink {
    jobs: usize,
}

impl OrderSink for TableSink {
    fn consume(&mut self, records: &[OrderRecord]) -> Result<(), SlipmatchError> {
        self.jobs += 1;
        println!("--- Job {} ({} order(s)) ---\n", self.jobs, records.len());
        println!("{}", format_records(records));
        Ok(())
    }
}
