use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single option value handed to the node binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Table(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Parse a CLI-supplied value: `true`/`false`, integers, floats, else a string.
    pub fn parse(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            return ConfigValue::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return ConfigValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return ConfigValue::Float(f);
            }
        }
        ConfigValue::Str(raw.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::Str(s) => f.write_str(s),
            ConfigValue::Table(t) => {
                let body: Vec<String> = t.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", body.join(","))
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Str(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Int(i)
    }
}

/// Options passed to the node binary, keyed by option name.
///
/// Keys are stored sorted so the generated argument list is stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchConfig {
    entries: BTreeMap<String, ConfigValue>,
}

impl LaunchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON object on disk.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert under a dotted path, creating nested tables along the way.
    ///
    /// `rpc.laddr` becomes `{rpc: {laddr: ...}}`. A scalar sitting where a
    /// table is needed is a configuration error.
    pub fn set_path(&mut self, path: &str, value: ConfigValue) -> Result<()> {
        let mut parts: Vec<&str> = path.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(Error::Config(format!("invalid option name {:?}", path)));
        }
        let leaf = parts.pop().unwrap_or_default();

        let mut table = &mut self.entries;
        for part in parts {
            let slot = table
                .entry(part.to_string())
                .or_insert_with(|| ConfigValue::Table(BTreeMap::new()));
            table = match slot {
                ConfigValue::Table(inner) => inner,
                other => {
                    return Err(Error::Config(format!(
                        "option {:?} is already set to {} and cannot hold {:?}",
                        part, other, path
                    )))
                }
            };
        }
        table.insert(leaf.to_string(), value);
        Ok(())
    }

    /// Parse a `KEY=VALUE` pair as given on the command line.
    pub fn set_pair(&mut self, pair: &str) -> Result<()> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("expected KEY=VALUE, got {:?}", pair)))?;
        self.set_path(key.trim(), ConfigValue::parse(value))
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Look up a dotted path such as `rpc.laddr`.
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut parts = path.split('.');
        let mut current = self.entries.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// A required option that must be a non-empty string.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        match self.entries.get(key) {
            Some(ConfigValue::Str(s)) if !s.is_empty() => Ok(s),
            Some(other) => Err(Error::Config(format!(
                "{:?} must be a non-empty string, got {}",
                key, other
            ))),
            None => Err(Error::Config(format!("{:?} argument is required", key))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parsing() {
        assert_eq!(ConfigValue::parse("true"), ConfigValue::Bool(true));
        assert_eq!(ConfigValue::parse("42"), ConfigValue::Int(42));
        assert_eq!(ConfigValue::parse("1.5"), ConfigValue::Float(1.5));
        assert_eq!(
            ConfigValue::parse("tcp://0.0.0.0:26657"),
            ConfigValue::Str("tcp://0.0.0.0:26657".into())
        );
    }

    #[test]
    fn test_set_path_creates_tables() {
        let mut config = LaunchConfig::new();
        config.set_pair("rpc.laddr=tcp://0.0.0.0:1234").unwrap();
        config.set_pair("rpc.unsafe=true").unwrap();

        assert_eq!(
            config.get_path("rpc.laddr").and_then(ConfigValue::as_str),
            Some("tcp://0.0.0.0:1234")
        );
        assert_eq!(config.get_path("rpc.unsafe"), Some(&ConfigValue::Bool(true)));
        assert_eq!(config.get("rpc").and_then(|v| v.as_table()).map(|t| t.len()), Some(2));
    }

    #[test]
    fn test_set_path_rejects_scalar_parent() {
        let mut config = LaunchConfig::new().with("rpc", "plain");
        assert!(matches!(
            config.set_path("rpc.laddr", "x".into()),
            Err(Error::Config(_))
        ));
        assert!(config.set_pair("no-equals-sign").is_err());
        assert!(config.set_pair("a..b=1").is_err());
    }

    #[test]
    fn test_require_str() {
        let config = LaunchConfig::new()
            .with("home", "/tmp/x")
            .with("empty", "")
            .with("count", 3i64);

        assert_eq!(config.require_str("home").unwrap(), "/tmp/x");
        assert!(config.require_str("empty").is_err());
        assert!(config.require_str("count").is_err());
        let err = config.require_str("missing").unwrap_err();
        assert!(err.to_string().contains("\"missing\" argument is required"));
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: LaunchConfig = serde_json::from_str(
            r#"{"home": "/tmp/x", "rpc": {"laddr": "tcp://0.0.0.0:5"}, "fast_sync": false}"#,
        )
        .unwrap();

        assert_eq!(config.get("home"), Some(&ConfigValue::Str("/tmp/x".into())));
        assert_eq!(config.get("fast_sync"), Some(&ConfigValue::Bool(false)));
        assert!(config.get_path("rpc.laddr").is_some());
    }
}
