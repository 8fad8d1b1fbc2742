use std::collections::HashMap;
use std::sync::{Arc, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use super::{ConnectionId, DishId, Result, ViewerCountUpdate};
use crate::ports::{BroadcastPort, PresencePort};

/// Per-dish notification lanes, dropped again once nobody uses them.
#[derive(Default)]
struct DishLanes {
    lanes: std::sync::Mutex<HashMap<DishId, Arc<Mutex<()>>>>,
}

impl DishLanes {
    fn map(&self) -> MutexGuard<'_, HashMap<DishId, Arc<Mutex<()>>>> {
        self.lanes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, dish: &DishId) -> Lane<'_> {
        let lane = self.map().entry(*dish).or_default().clone();
        let guard = lane.lock_owned().await;
        Lane {
            lanes: self,
            dish: *dish,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map().len()
    }
}

struct Lane<'a> {
    lanes: &'a DishLanes,
    dish: DishId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Lane<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // a waiter holds its own clone, so a lone reference means the lane is idle
        let mut lanes = self.lanes.map();
        if lanes.get(&self.dish).is_some_and(|lane| Arc::strong_count(lane) == 1) {
            lanes.remove(&self.dish);
        }
    }
}

/// Hub-side logic for live dish viewer counts.
///
/// Translates connection lifecycle events into tracker calls and fans the
/// resulting counts out to each affected dish's group. The count published to
/// a group is read inside that dish's lane, so the last notification a group
/// receives always matches the tracker. Different dishes never wait on each
/// other.
#[derive(Clone)]
pub struct DishViewersService {
    presence: Arc<dyn PresencePort>,
    broadcast: Arc<dyn BroadcastPort>,
    lanes: Arc<DishLanes>,
}

impl DishViewersService {
    pub fn new(presence: Arc<dyn PresencePort>, broadcast: Arc<dyn BroadcastPort>) -> Self {
        Self {
            presence,
            broadcast,
            lanes: Arc::new(DishLanes::default()),
        }
    }

    /// The joining connection is part of the group by the time the count is
    /// published, so it receives its own update.
    pub async fn start_viewing(&self, connection: &ConnectionId, dish: &DishId) -> Result<usize> {
        let count = self.presence.start_viewing(dish, connection);
        self.broadcast.join_group(dish, connection).await?;
        self.publish_count(dish).await?;
        Ok(count)
    }

    pub async fn stop_viewing(&self, connection: &ConnectionId, dish: &DishId) -> Result<usize> {
        let count = self.presence.stop_viewing(dish, connection);
        self.broadcast.leave_group(dish, connection).await?;
        self.publish_count(dish).await?;
        Ok(count)
    }

    /// Must run exactly once per terminated connection.
    ///
    /// Every affected dish is notified even if an earlier one fails.
    pub async fn disconnect(&self, connection: &ConnectionId) -> Vec<ViewerCountUpdate> {
        let removed = self.presence.remove_connection_from_all(connection);
        let mut updates = Vec::with_capacity(removed.len());

        for (dish, count) in removed {
            if let Err(e) = self.broadcast.leave_group(&dish, connection).await {
                warn!("Failed to leave group {} for {}: {}", dish, connection, e);
            }

            match self.publish_count(&dish).await {
                Ok(update) => updates.push(update),
                Err(e) => {
                    warn!("Failed to notify viewers of {}: {}", dish, e);
                    updates.push(ViewerCountUpdate::new(dish, count));
                }
            }
        }

        if !updates.is_empty() {
            info!("{} left {} dish(es)", connection, updates.len());
        }
        updates
    }

    pub fn viewer_count(&self, dish: &DishId) -> ViewerCountUpdate {
        ViewerCountUpdate::new(*dish, self.presence.viewer_count(dish))
    }

    pub fn active_dishes(&self) -> Vec<ViewerCountUpdate> {
        self.presence
            .active_dishes()
            .into_iter()
            .map(|(dish, count)| ViewerCountUpdate::new(dish, count))
            .collect()
    }

    async fn publish_count(&self, dish: &DishId) -> Result<ViewerCountUpdate> {
        let _lane = self.lanes.enter(dish).await;
        let update = self.viewer_count(dish);
        self.broadcast.publish(dish, update.into()).await?;
        Ok(update)
    }
}
