//! Configuration loading for the CLI

use std::path::Path;

use integration_trias::TriasConfig;

/// Load the TRIAS configuration
///
/// Sources in increasing priority: built-in defaults, `trias.toml` in the
/// working directory (or `path` if given), then `TRIAS_*` environment
/// variables (e.g. `TRIAS_BASE_URL`, `TRIAS_REQUESTOR_REF`).
pub fn load(path: Option<&Path>) -> Result<TriasConfig, config::ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("trias").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix("TRIAS").try_parsing(true));

    let config = builder.build()?;
    config.try_deserialize()
}
