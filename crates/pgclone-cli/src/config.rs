use std::collections::BTreeMap;
use std::path::Path;

use pgclone_connect::{DatabaseSettings, Role};
use pgclone_core::DuplicationPlan;

use crate::CliError;

/// Configuration keys from the process environment layered over an
/// optional `.env`-style file. The process environment wins.
#[derive(Debug, Default)]
pub struct EnvSource {
    file: BTreeMap<String, String>,
}

impl EnvSource {
    pub fn load(env_file: Option<&Path>) -> Result<Self, CliError> {
        let file = match env_file {
            Some(path) => load_env_file(path)?,
            None => BTreeMap::new(),
        };
        Ok(Self { file })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.file.get(key).cloned())
    }

    pub fn settings(&self, role: Role) -> Result<DatabaseSettings, CliError> {
        Ok(DatabaseSettings::from_lookup(role, |key| self.get(key))?)
    }
}

/// Parse `KEY=VALUE` lines; blank lines and `#` comments are skipped.
pub fn load_env_file(path: &Path) -> Result<BTreeMap<String, String>, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_env(&content))
}

fn parse_env(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let mut parts = line.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();
        if key.is_empty() {
            continue;
        }
        values.insert(key.to_string(), unquote(value).to_string());
    }
    values
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

pub fn load_plan(path: &Path) -> Result<DuplicationPlan, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(DuplicationPlan::from_toml_str(&content)?)
}
