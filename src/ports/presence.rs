use crate::domain::{ConnectionId, DishId};

/// Port for tracking which connections are viewing which dishes
///
/// Every method is atomic with respect to the tracked state and never fails:
/// unknown dishes and connections simply yield the empty answer.
pub trait PresencePort: Send + Sync {
    /// Record that a connection is viewing a dish, returning the dish's viewer count
    fn start_viewing(&self, dish: &DishId, connection: &ConnectionId) -> usize;

    /// Forget that a connection is viewing a dish, returning the dish's viewer count
    fn stop_viewing(&self, dish: &DishId, connection: &ConnectionId) -> usize;

    /// Drop a connection from every dish it was viewing
    ///
    /// Returns one `(dish, count)` pair per dish actually affected, in no
    /// particular order.
    fn remove_connection_from_all(&self, connection: &ConnectionId) -> Vec<(DishId, usize)>;

    fn viewer_count(&self, dish: &DishId) -> usize;

    /// Snapshot of every dish with at least one viewer
    fn active_dishes(&self) -> Vec<(DishId, usize)>;
}
