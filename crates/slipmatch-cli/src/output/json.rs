use slipmatch_core::error::SlipmatchError;
use slipmatch_core::model::OrderRecord;
use slipmatch_core::pipeline::OrderSink;

pub fn print(records: &[OrderRecord]) -> Result<(), SlipmatchError> {
    let json = serde_json::to_string_pretty(records)?;
    println!("{json}");
    Ok(())
}

/// Prints one compact JSON object per record, for piping into other tools.
pub struct JsonLinesSink;

impl OrderSink for JsonLinesSink {
    fn consume(&mut self, records: &[OrderRecord]) -> Result<(), SlipmatchError> {
        for record in records {
            println!("{}", serde_json::to_string(record)?);
        }
        Ok(())
    }
}
