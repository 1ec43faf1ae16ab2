//! Reading of the PowerShell dependency manifest (`requirements.psd1`)
//!
//! The manifest is a PowerShell data file. It is converted to JSON by
//! PowerShell itself and parsed here.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Entry holding installer options rather than a module.
const OPTIONS_KEY: &str = "PSDependOptions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredModule {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyManifest {
    pub modules: Vec<DeclaredModule>,
}

impl DependencyManifest {
    /// Parses the JSON form of the manifest. Modules are sorted by name.
    ///
    /// An entry is either a bare version string or a table with a `Version` key.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).context("Dependency manifest is not valid JSON")?;

        let Value::Object(entries) = value else {
            bail!("Dependency manifest must be a table of modules");
        };

        let mut modules: Vec<DeclaredModule> = entries
            .into_iter()
            .filter(|(name, _)| name != OPTIONS_KEY)
            .map(|(name, spec)| DeclaredModule {
                version: version_of(&spec),
                name,
            })
            .collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { modules })
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn version_of(spec: &Value) -> Option<String> {
    match spec {
        Value::String(version) => Some(version.clone()),
        Value::Object(table) => table
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("version"))
            .and_then(|(_, v)| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}
