use crate::domain::{ConnectionId, DishId};
use crate::ports::PresencePort;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Default)]
struct Viewers {
    by_dish: HashMap<DishId, HashSet<ConnectionId>>,
    by_connection: HashMap<ConnectionId, HashSet<DishId>>,
}

impl Viewers {
    fn count(&self, dish: &DishId) -> usize {
        self.by_dish.get(dish).map_or(0, HashSet::len)
    }

    /// Removes `connection` from `dish`, pruning the dish once nobody is left.
    /// Returns whether the connection was actually a viewer.
    fn detach(&mut self, dish: &DishId, connection: &ConnectionId) -> bool {
        let Some(viewers) = self.by_dish.get_mut(dish) else {
            return false;
        };
        let removed = viewers.remove(connection);
        if viewers.is_empty() {
            self.by_dish.remove(dish);
        }
        removed
    }
}

/// In-memory presence tracker for dish viewers.
///
/// Both indices live behind a single mutex, so a reader never observes a dish
/// set and the reverse index out of step.
pub struct ActiveDishViewers {
    state: Mutex<Viewers>,
}

impl ActiveDishViewers {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Viewers::default()),
        }
    }

    // Every mutation completes before the guard is released, so a poisoned lock
    // still holds consistent indices.
    fn lock(&self) -> MutexGuard<'_, Viewers> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActiveDishViewers {
    fn default() -> Self {
        Self::new()
    }
}

impl PresencePort for ActiveDishViewers {
    fn start_viewing(&self, dish: &DishId, connection: &ConnectionId) -> usize {
        let mut state = self.lock();

        let viewers = state.by_dish.entry(*dish).or_default();
        viewers.insert(connection.clone());
        let count = viewers.len();

        state
            .by_connection
            .entry(connection.clone())
            .or_default()
            .insert(*dish);

        debug!(%dish, %connection, count, "viewer joined");
        count
    }

    fn stop_viewing(&self, dish: &DishId, connection: &ConnectionId) -> usize {
        let mut state = self.lock();

        if state.detach(dish, connection) {
            if let Some(dishes) = state.by_connection.get_mut(connection) {
                dishes.remove(dish);
                if dishes.is_empty() {
                    state.by_connection.remove(connection);
                }
            }
            debug!(%dish, %connection, "viewer left");
        }

        state.count(dish)
    }

    fn remove_connection_from_all(&self, connection: &ConnectionId) -> Vec<(DishId, usize)> {
        let mut state = self.lock();

        let Some(dishes) = state.by_connection.remove(connection) else {
            return Vec::new();
        };

        let mut affected = Vec::with_capacity(dishes.len());
        for dish in dishes {
            if state.detach(&dish, connection) {
                affected.push((dish, state.count(&dish)));
            }
        }

        debug!(%connection, dishes = affected.len(), "connection removed from all dishes");
        affected
    }

    fn viewer_count(&self, dish: &DishId) -> usize {
        self.lock().count(dish)
    }

    fn active_dishes(&self) -> Vec<(DishId, usize)> {
        self.lock()
            .by_dish
            .iter()
            .map(|(dish, viewers)| (*dish, viewers.len()))
            .collect()
    }
}
