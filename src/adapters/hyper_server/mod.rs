mod adapter;
mod server;
mod session;

pub use adapter::HyperHubAdapter;
pub use server::serve;
pub use session::HubSession;
