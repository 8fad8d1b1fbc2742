use crate::domain::{ConnectionId, DishId, Result, ServerMessage};
use async_trait::async_trait;

/// Port for per-dish broadcast groups provided by the transport
#[async_trait]
pub trait BroadcastPort: Send + Sync {
    /// Subscribe a connection to a dish's notifications
    async fn join_group(&self, dish: &DishId, connection: &ConnectionId) -> Result<()>;

    /// Unsubscribe a connection from a dish's notifications
    async fn leave_group(&self, dish: &DishId, connection: &ConnectionId) -> Result<()>;

    /// Send a message to every member of a dish's group
    ///
    /// Returns how many members the message was handed to.
    async fn publish(&self, dish: &DishId, message: ServerMessage) -> Result<usize>;
}
