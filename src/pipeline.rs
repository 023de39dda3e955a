//! The end-to-end pipeline: fetch, load, normalize and chart.

use crate::chart::spec::{ChartSpec, Labels, Mark};
use crate::chart::theme::Theme;
use crate::config::PipelineConfig;
use crate::download::fetcher::{FetchedFile, Fetcher};
use crate::error::UrchinError;
use crate::table::loader::load_fetched;
use crate::table::normalize::normalize;
use crate::table::record::NormalizedTable;
use crate::table::schema::{COL_COMMON_NAME, COL_DATE, COL_DRY_GM2};
use crate::utils::ensure_output_dir_exists;
use bon::bon;
use chrono::NaiveDate;
use log::info;
use polars::prelude::DataFrame;
use std::path::PathBuf;

/// Client for the urchin biomass pipeline.
///
/// Each stage is exposed on its own so callers can stop early, e.g. to work
/// with the [`NormalizedTable`] instead of a chart.
pub struct UrchinBiomass {
    config: PipelineConfig,
    fetcher: Fetcher,
}

#[bon]
impl UrchinBiomass {
    /// Creates a client using the default curl then HTTP strategies.
    ///
    /// # Errors
    ///
    /// Returns [`UrchinError::Config`] if the config does not validate and
    /// [`UrchinError::Transfer`] if the HTTP client cannot be built.
    pub fn new(config: PipelineConfig) -> Result<Self, UrchinError> {
        let fetcher = Fetcher::new(&config.user_agent, config.timeout())?;
        Self::with_fetcher(config, fetcher)
    }

    /// Creates a client with a custom [`Fetcher`].
    pub fn with_fetcher(config: PipelineConfig, fetcher: Fetcher) -> Result<Self, UrchinError> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn fetch(&self) -> Result<FetchedFile, UrchinError> {
        Ok(self.fetcher.fetch(&self.config.url).await?)
    }

    /// Parses a fetched file with the configured column names. The file is
    /// deleted whether or not parsing succeeds.
    pub async fn load(&self, file: FetchedFile) -> Result<DataFrame, UrchinError> {
        Ok(load_fetched(file, &self.config.columns).await?)
    }

    pub fn normalize(&self, raw: &DataFrame) -> Result<NormalizedTable, UrchinError> {
        Ok(normalize(raw, &self.config.normalize_options())?)
    }

    /// Describes the biomass chart for a normalized table.
    pub fn chart(&self, table: &NormalizedTable) -> Result<ChartSpec, UrchinError> {
        let config = &self.config;
        let domain = NaiveDate::from_ymd_opt(config.year_min as i32, 1, 1)
            .zip(NaiveDate::from_ymd_opt(config.year_max as i32, 12, 31));

        Ok(ChartSpec::builder()
            .data(table.frame.clone())
            .x(COL_DATE)
            .y(COL_DRY_GM2)
            .category(COL_COMMON_NAME)
            .marks(vec![Mark::Point, Mark::Line])
            .color_scale(config.color_scale()?)
            .theme(Theme::minimal())
            .labels(Labels {
                title: format!(
                    "Urchin dry biomass at {}, {}-{}",
                    config.site.to_uppercase(),
                    config.year_min,
                    config.year_max
                ),
                x: "Date".to_string(),
                y: "Dry biomass (g/m2)".to_string(),
                legend: "Species".to_string(),
            })
            .maybe_x_domain(domain)
            .size((config.width, config.height))
            .build())
    }

    /// Runs every stage and writes the chart.
    ///
    /// # Arguments
    ///
    /// * `.output(PathBuf)`: Optional. Overrides the configured output path.
    ///
    /// # Returns
    ///
    /// The path of the written chart.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use urchin_biomass::{PipelineConfig, UrchinBiomass, UrchinError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), UrchinError> {
    /// let client = UrchinBiomass::new(PipelineConfig::default())?;
    /// let path = client.run().output("urchins.png".into()).call().await?;
    /// println!("Chart written to {}", path.display());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn run(&self, output: Option<PathBuf>) -> Result<PathBuf, UrchinError> {
        let output = output.unwrap_or_else(|| self.config.output.clone());

        let fetched = self.fetch().await?;
        let raw = self.load(fetched).await?;
        let table = self.normalize(&raw)?;

        for species in table.summary()? {
            info!(
                "{}: {} observations from {} to {}",
                species.common_name, species.observations, species.first, species.last
            );
        }

        let chart = self.chart(&table)?;
        ensure_output_dir_exists(&output)
            .await
            .map_err(|e| UrchinError::OutputDirCreation(output.clone(), e))?;
        chart.save(&output)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::error::RenderError;
    use crate::config::ConfigError;
    use crate::download::error::TransferError;
    use crate::download::strategy::TransferStrategy;
    use crate::table::loader::tests::source_line;
    use crate::table::schema::SOURCE_COLUMNS;
    use async_trait::async_trait;
    use std::path::Path;

    /// Writes a fixed CSV body instead of downloading.
    struct Canned(String);

    #[async_trait]
    impl TransferStrategy for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn transfer(&self, _url: &str, destination: &Path) -> Result<(), TransferError> {
            tokio::fs::write(destination, self.0.as_bytes())
                .await
                .map_err(|e| TransferError::Io(destination.to_path_buf(), e))
        }
    }

    fn canned_client(lines: &[String]) -> UrchinBiomass {
        let mut body = SOURCE_COLUMNS.join(",");
        for line in lines {
            body.push('\n');
            body.push_str(line);
        }
        body.push('\n');
        let fetcher = Fetcher::with_strategies(vec![Box::new(Canned(body))]);
        UrchinBiomass::with_fetcher(PipelineConfig::default(), fetcher).unwrap()
    }

    fn survey_lines() -> Vec<String> {
        vec![
            source_line(&[("YEAR", "2016"), ("DATE", "2016-08-03"), ("DRY_GM2", "20.1")]),
            source_line(&[
                ("YEAR", "2015"),
                ("DATE", "2015-08-01"),
                ("COMMON_NAME", "Purple Urchin"),
                ("DRY_GM2", "8.5"),
            ]),
            source_line(&[("YEAR", "2015"), ("DATE", "2015-08-01"), ("DRY_GM2", "12.4")]),
            source_line(&[("COMMON_NAME", "California sheephead")]),
            source_line(&[("SITE", "AQUE")]),
            source_line(&[("YEAR", "2010"), ("DATE", "2010-03-01")]),
        ]
    }

    #[tokio::test]
    async fn test_stages_offline() -> Result<(), UrchinError> {
        let client = canned_client(&survey_lines());

        let fetched = client.fetch().await?;
        assert_eq!(fetched.strategy(), "canned");
        let raw = client.load(fetched).await?;
        assert_eq!(raw.height(), 6);

        let table = client.normalize(&raw)?;
        let records = table.records()?;
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.site == "napl"));

        let chart = client.chart(&table)?.resolve()?;
        assert_eq!(chart.series.len(), 2);
        // 3 markers, one segment for the two red urchin surveys
        assert_eq!(chart.mark_count(), 4);
        assert_eq!(chart.labels.title, "Urchin dry biomass at NAPL, 2014-2024");
        assert_eq!(chart.labels.y, "Dry biomass (g/m2)");
        assert_eq!(chart.legend_title, "Species");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_selection_still_charts() -> Result<(), UrchinError> {
        let client = canned_client(&[source_line(&[("SITE", "MOHK")])]);

        let raw = client.load(client.fetch().await?).await?;
        let table = client.normalize(&raw)?;
        assert!(table.is_empty());

        let chart = client.chart(&table)?.resolve()?;
        assert_eq!(chart.mark_count(), 0);
        assert_eq!(
            chart.x_range.0,
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_run_rejects_unknown_output_format() {
        let client = canned_client(&survey_lines());
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("urchins.pdf");

        let result = client.run().output(output).call().await;
        assert!(matches!(
            result,
            Err(UrchinError::Render(RenderError::UnsupportedOutput(_)))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            year_min: 2030,
            ..PipelineConfig::default()
        };
        let result = UrchinBiomass::with_fetcher(config, Fetcher::with_strategies(vec![]));
        assert!(matches!(
            result,
            Err(UrchinError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[tokio::test]
    #[ignore = "downloads the dataset from EDI"]
    async fn test_run_against_edi() -> Result<(), UrchinError> {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("urchins.svg");
        let client = UrchinBiomass::new(PipelineConfig::default())?;

        let written = client.run().output(output.clone()).call().await?;
        assert_eq!(written, output);
        assert!(std::fs::metadata(&output).map(|m| m.len() > 0).unwrap_or(false));
        Ok(())
    }
}
