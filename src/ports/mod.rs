pub mod broadcast;
pub mod presence;

pub use broadcast::BroadcastPort;
pub use presence::PresencePort;
