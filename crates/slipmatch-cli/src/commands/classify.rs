use slipmatch_core::config::Config;
use slipmatch_core::error::SlipmatchError;
use slipmatch_core::pipeline::Pipeline;
use std::path::Path;

pub fn run(config: &Config, pdf: &Path) -> Result<(), SlipmatchError> {
    let pipeline = Pipeline::from_config(config);
    let kind = slipmatch_core::classify_pdf(&pipeline, pdf)?;
    println!("{}: {kind}", pdf.display());
    Ok(())
}
