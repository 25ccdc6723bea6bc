//! Translation of a [`LaunchConfig`] into command-line flags for the node binary.

use crate::config::{ConfigValue, LaunchConfig};

/// Build the flag list for `config`.
///
/// * scalars become `--name=value`
/// * `true` becomes a bare `--name`, `false` becomes `--name=false`
/// * nested tables are flattened with dots: `--rpc.laddr=...`
/// * camelCase names are dash-joined: `chainId` -> `--chain-id`
pub fn flags(config: &LaunchConfig) -> Vec<String> {
    let mut args = Vec::new();
    for (key, value) in config.iter() {
        push_flag(&mut args, &option_name(key), value);
    }
    args
}

fn push_flag(args: &mut Vec<String>, name: &str, value: &ConfigValue) {
    match value {
        ConfigValue::Bool(true) => args.push(format!("--{}", name)),
        ConfigValue::Table(table) => {
            for (key, inner) in table {
                push_flag(args, &format!("{}.{}", name, option_name(key)), inner);
            }
        }
        other => args.push(format!("--{}={}", name, other)),
    }
}

fn option_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
