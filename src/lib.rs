mod chart;
mod config;
mod download;
mod error;
mod pipeline;
mod table;
mod utils;

pub use error::UrchinError;
pub use pipeline::UrchinBiomass;

pub use config::{ConfigError, PipelineConfig, DEFAULT_URL, DEFAULT_USER_AGENT};
pub use utils::{
    default_config_path, discover_config_path, ensure_output_dir_exists, CONFIG_ENV_VAR,
};

pub use download::error::TransferError;
pub use download::fetcher::{FetchedFile, Fetcher};
pub use download::strategy::{CurlTransfer, HttpTransfer, TransferStrategy};

pub use table::error::{LoadError, NormalizeError};
pub use table::loader::{load_fetched, read_csv};
pub use table::normalize::{normalize, NormalizeOptions, UrchinFrameFilterExt};
pub use table::record::{NormalizedRecord, NormalizedTable, SpeciesSummary};
pub use table::schema::{
    canonical_column_name, canonical_column_names, default_source_columns, COL_COMMON_NAME,
    COL_DATE, COL_DRY_GM2, COL_SITE, COL_YEAR, PROJECTED_COLUMNS, SOURCE_COLUMNS,
};

pub use chart::draw::OutputFormat;
pub use chart::error::RenderError;
pub use chart::scale::{ColorScale, MarkerShape, Rgb, UnknownCategoryPolicy};
pub use chart::spec::{ChartSpec, Labels, LegendEntry, Mark, ResolvedChart, Series};
pub use chart::theme::Theme;
