//! Data directory layout.
//!
//! ```text
//! <data-dir>/config.json            {"parameters": {...}}
//! <data-dir>/in/tables/<table>.csv  the single input table
//! <data-dir>/out/tables/            reports written by the run
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

const CONFIG_FILE: &str = "config.json";
const MANIFEST_SUFFIX: &str = ".manifest";

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    parameters: Value,
}

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_tables_dir(&self) -> PathBuf {
        self.root.join("in").join("tables")
    }

    pub fn output_tables_dir(&self) -> PathBuf {
        self.root.join("out").join("tables")
    }

    /// Read the `parameters` object of `config.json`.
    pub fn load_parameters(&self) -> Result<Value> {
        let path = self.root.join(CONFIG_FILE);
        let content = fs::read_to_string(&path).map_err(|err| {
            Error::configuration(format!("Cannot read {}: {err}", path.display()))
        })?;
        let config: ConfigFile = serde_json::from_str(&content).map_err(|err| {
            Error::configuration(format!("Invalid {}: {err}", path.display()))
        })?;
        Ok(config.parameters)
    }

    /// Path of the single input table. Manifests are not tables.
    pub fn input_table(&self) -> Result<PathBuf> {
        let dir = self.input_tables_dir();
        let mut tables = Vec::new();
        if dir.is_dir() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                let is_manifest = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(MANIFEST_SUFFIX));
                if path.is_file() && !is_manifest {
                    tables.push(path);
                }
            }
        }
        debug!(dir = %dir.display(), tables = tables.len(), "Listed input tables");

        match tables.len() {
            0 => Err(Error::configuration(
                "No input table added. Please add an input table",
            )),
            1 => Ok(tables.remove(0)),
            _ => Err(Error::configuration(
                "Too many input tables added. Please add only one input table",
            )),
        }
    }
}
