use slipmatch_core::config::Config;
use slipmatch_core::error::SlipmatchError;
use slipmatch_core::pipeline::Pipeline;
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(
    config: &Config,
    first: &Path,
    second: &Path,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<(), SlipmatchError> {
    let pipeline = Pipeline::from_config(config);
    let records = slipmatch_core::match_pdfs(&pipeline, first, second)?;

    match output_file {
        Some(path) => {
            // Always JSON when saving to file
            let json = serde_json::to_string_pretty(&records)?;
            std::fs::write(&path, json)?;
            eprintln!("Matched {} order(s), written to {}", records.len(), path.display());
        }
        None => match output_format {
            "json" => output::json::print(&records)?,
            _ => print!("{}", output::table::format_records(&records)),
        },
    }

    Ok(())
}
