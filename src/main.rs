use anyhow::Result;
use env_logger::Env;
use log::info;
use xrdsim::{sampling, settings};

fn main() -> Result<()> {
    let log_level = if settings::verbose_requested() {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let settings = settings::load_config()?;
    info!("{}", settings);

    let samples = sampling::run(&settings)?;
    sampling::write_samples(&samples, &settings.output)?;

    Ok(())
}
