pub mod broadcast;
pub mod hyper_server;
pub mod tracking;

pub use broadcast::*;
pub use hyper_server::{serve, HyperHubAdapter};
pub use tracking::*;
