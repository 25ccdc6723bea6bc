// Focused CLI parsing tests (tests command-line parsing only, not business logic)

use std::path::PathBuf;

use clap::Parser;
use tmnode::cli::{Cli, Commands, WaitFor};
use tmnode::ConfigValue;

#[test]
fn test_all_commands_parse() {
    let test_cases = vec![
        vec!["tmnode", "node", "--home", "/tmp/node"],
        vec!["tmnode", "node", "--home", "/tmp/node", "--wait", "synced", "--timeout", "60"],
        vec!["tmnode", "lite", "--target", "tcp://n:26657", "--chain-id", "c", "--home", "/tmp/l"],
        vec!["tmnode", "init", "--home", "/tmp/node"],
        vec!["tmnode", "version"],
        vec!["tmnode", "gen-validator"],
        vec!["tmnode", "--binary", "/opt/tendermint", "--forward-logs", "version"],
    ];

    for args in test_cases {
        Cli::try_parse_from(&args).unwrap_or_else(|e| panic!("Failed to parse {:?}: {}", args, e));
    }
}

#[test]
fn test_node_with_all_options() {
    let args = vec![
        "tmnode", "node",
        "--home", "/tmp/node",
        "--set", "rpc.laddr=tcp://0.0.0.0:36657",
        "--set", "fast_sync=false",
        "--wait", "none",
        "--stop-grace", "3",
        "--binary", "/opt/tendermint",
    ];

    let cli = Cli::try_parse_from(args).unwrap();
    assert_eq!(cli.binary, Some(PathBuf::from("/opt/tendermint")));
    assert!(!cli.forward_logs);

    match cli.cmd {
        Commands::Node(n) => {
            assert_eq!(n.home, PathBuf::from("/tmp/node"));
            assert_eq!(n.launch.wait, WaitFor::NoWait);
            assert_eq!(n.launch.stop_grace, 3);
            assert_eq!(n.launch.timeout, None);

            let config = n.launch.to_config().unwrap();
            assert_eq!(
                config.get_path("rpc.laddr"),
                Some(&ConfigValue::Str("tcp://0.0.0.0:36657".into()))
            );
            assert_eq!(config.get("fast_sync"), Some(&ConfigValue::Bool(false)));
        }
        _ => panic!("Expected Node command"),
    }
}

#[test]
fn test_defaults() {
    let cli = Cli::try_parse_from(["tmnode", "node", "--home", "/tmp/node"]).unwrap();
    match cli.cmd {
        Commands::Node(n) => {
            assert_eq!(n.launch.wait, WaitFor::Started);
            assert_eq!(n.launch.stop_grace, 10);
            assert!(n.launch.to_config().unwrap().is_empty());
        }
        _ => panic!("Expected Node command"),
    }
}

#[test]
fn test_config_file_with_overrides() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("node.json");
    std::fs::write(&path, r#"{"moniker": "alpha", "rpc": {"laddr": "tcp://0.0.0.0:1"}}"#).unwrap();

    let cli = Cli::try_parse_from([
        "tmnode",
        "lite",
        "--target",
        "tcp://n:26657",
        "--chain-id",
        "c",
        "--home",
        "/tmp/l",
        "--config",
        path.to_str().unwrap(),
        "--set",
        "rpc.laddr=tcp://0.0.0.0:2",
    ])
    .unwrap();

    match cli.cmd {
        Commands::Lite(l) => {
            assert_eq!(l.chain_id, "c");
            let config = l.launch.to_config().unwrap();
            assert_eq!(config.get("moniker"), Some(&ConfigValue::Str("alpha".into())));
            assert_eq!(
                config.get_path("rpc.laddr"),
                Some(&ConfigValue::Str("tcp://0.0.0.0:2".into()))
            );
        }
        _ => panic!("Expected Lite command"),
    }
}

#[test]
fn test_rejects_bad_input() {
    assert!(Cli::try_parse_from(["tmnode", "node"]).is_err(), "--home is required");
    assert!(Cli::try_parse_from(["tmnode", "node", "--home", "/x", "--wait", "later"]).is_err());

    let cli = Cli::try_parse_from(["tmnode", "node", "--home", "/x", "--set", "novalue"]).unwrap();
    match cli.cmd {
        Commands::Node(n) => assert!(n.launch.to_config().is_err()),
        _ => panic!("Expected Node command"),
    }
}
