pub mod client;
pub mod endpoint;

pub use client::{NodeStatus, RpcClient, StatusSource, SyncInfo};
pub use endpoint::{RpcEndpoint, FULL_NODE_RPC_PORT, LIGHT_CLIENT_RPC_PORT};
