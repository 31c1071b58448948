use super::Config;
use std::path::Path;

/// Loads `path`, falling back to the built-in defaults when the file is absent.
/// A file that exists but fails to parse is still an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        let config = Config::from_file(path)?;
        log::info!("Loaded configuration from: {}", path.display());
        Ok(config)
    } else {
        log::warn!(
            "Configuration file '{}' not found, using default configuration",
            path.display()
        );
        Ok(Config::default())
    }
}
