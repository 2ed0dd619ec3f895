//! `.env` loading and the dev-vars file.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Variables the server reads, in the order they are written out.
/// `true` marks keys the server refuses to start without.
pub const APP_VARS: &[(&str, bool)] = &[
    ("DATABASE_URL", true),
    ("FULLNAME", true),
    ("JWKS_URI", true),
    ("PORT", false),
    ("APP_ENV", false),
    ("DATABASE_MAX_CONNECTIONS", false),
    ("RUN_MIGRATIONS", false),
    ("JWKS_CACHE_TTL_SECONDS", false),
    ("JWKS_FETCH_TIMEOUT_SECONDS", false),
    ("AUTH_LEEWAY_SECONDS", false),
];

/// Which `.env` file a command reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EnvTarget {
    Dev,
    Test,
}

impl EnvTarget {
    pub fn file_name(self) -> &'static str {
        match self {
            EnvTarget::Dev => ".env",
            EnvTarget::Test => ".env.test",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EnvTarget::Dev => "DEV",
            EnvTarget::Test => "TEST",
        }
    }
}

/// Read a dotenv file into a map without touching the process environment.
/// `${VAR}` references are expanded by dotenvy.
pub fn read_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.with_context(|| format!("cannot parse {}", path.display()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Load `.env` (if present) into the process environment, then read `key`.
pub fn require(key: &str) -> Result<String> {
    dotenvy::dotenv().ok();
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{key} is not defined in environment variables"),
    }
}

/// `KEY=value` lines for every app variable present in `lookup`.
///
/// Fails with the list of missing required keys.
pub fn render_dev_vars<F>(lookup: F) -> Result<(String, Vec<&'static str>), Vec<&'static str>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();
    let mut lines = Vec::new();
    let mut included = Vec::new();

    for &(key, required) in APP_VARS {
        match lookup(key).filter(|v| !v.trim().is_empty()) {
            Some(value) => {
                lines.push(format!("{key}={value}"));
                included.push(key);
            }
            None if required => missing.push(key),
            None => {}
        }
    }

    if !missing.is_empty() {
        return Err(missing);
    }
    Ok((lines.join("\n"), included))
}
