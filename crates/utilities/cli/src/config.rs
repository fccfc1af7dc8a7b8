//! TOML config file loading.

use crate::{CliError, CliResult};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Reads and deserializes a TOML config file.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| CliError::ReadConfig { path: path.to_path_buf(), source })?;
    toml::from_str(&contents)
        .map_err(|source| CliError::ParseConfig { path: path.to_path_buf(), source })
}
