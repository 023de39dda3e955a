use std::error::Error;
use std::path::PathBuf;
use urchin_biomass::{discover_config_path, PipelineConfig, UrchinBiomass, CONFIG_ENV_VAR};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match discover_config_path(explicit, std::env::var(CONFIG_ENV_VAR).ok()) {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            PipelineConfig::from_path(&path)?
        }
        None => PipelineConfig::default(),
    };

    let client = UrchinBiomass::new(config)?;
    match client.run().call().await {
        Ok(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            Err(e.into())
        }
    }
}
