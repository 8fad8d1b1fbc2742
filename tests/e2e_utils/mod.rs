#![cfg(test)]
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod hub_client;
pub mod hub_server;

pub use hub_client::HubClient;
pub use hub_server::TestHubServer;
