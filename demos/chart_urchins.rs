// demos/chart_urchins.rs
use std::path::PathBuf;
use urchin_biomass::{PipelineConfig, UrchinBiomass, UrchinError};

#[tokio::main]
async fn main() -> Result<(), UrchinError> {
    // Set RUST_LOG=info (or debug) to see each stage
    env_logger::init();

    // Widen the default window and write a PNG instead of the default SVG
    let config = PipelineConfig {
        year_min: 2010,
        output: PathBuf::from("charts/urchins_napl.png"),
        ..PipelineConfig::default()
    };
    let client = UrchinBiomass::new(config)?;

    let fetched = client.fetch().await?;
    println!("Downloaded {} bytes via {}", fetched.bytes(), fetched.strategy());

    let raw = client.load(fetched).await?;
    println!("Raw table: {:?}", raw.shape());

    let table = client.normalize(&raw)?;
    println!("{}", table.frame.head(Some(5)));

    for species in table.summary()? {
        println!(
            "{:<15} {:>5} surveys, {} to {}",
            species.common_name, species.observations, species.first, species.last
        );
    }

    let output = client.config().output.clone();
    urchin_biomass::ensure_output_dir_exists(&output)
        .await
        .map_err(|e| UrchinError::OutputDirCreation(output.clone(), e))?;
    let chart = client.chart(&table)?.save(&output)?;
    println!(
        "Wrote {} marks across {} species to {}",
        chart.mark_count(),
        chart.series.len(),
        output.display()
    );

    Ok(())
}
