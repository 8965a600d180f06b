use slipmatch_core::config::Config;
use slipmatch_core::error::SlipmatchError;

pub fn run(config: &Config) -> Result<(), SlipmatchError> {
    print!("{}", config.to_toml()?);
    Ok(())
}
