use std::io;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "urchin_biomass";
const CONFIG_FILE_NAME: &str = "config.json";
pub const CONFIG_ENV_VAR: &str = "URCHIN_BIOMASS_CONFIG";

/// `<config dir>/urchin_biomass/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Picks the config file to load: an explicit path, then the environment
/// variable, then the default location if a file exists there.
pub fn discover_config_path(
    explicit: Option<PathBuf>,
    env_value: Option<String>,
) -> Option<PathBuf> {
    explicit
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
        .or_else(|| default_config_path().filter(|p| p.is_file()))
}

/// Creates the parent directory of an output file when it is missing.
pub async fn ensure_output_dir_exists(output: &Path) -> io::Result<()> {
    let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    match tokio::fs::metadata(parent).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Output parent exists but is not a directory: {}", parent.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("Creating output directory: {}", parent.display());
            tokio::fs::create_dir_all(parent).await
        }
        Err(e) => Err(e),
    }
}
