use crate::domain::{ConnectionId, DishId, Result, ServerMessage, ViewerError};
use crate::ports::BroadcastPort;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;

pub type Outbox = UnboundedSender<ServerMessage>;

#[derive(Default)]
struct Groups {
    by_dish: HashMap<DishId, HashSet<ConnectionId>>,
    by_connection: HashMap<ConnectionId, HashSet<DishId>>,
}

impl Groups {
    fn remove(&mut self, dish: &DishId, connection: &ConnectionId) {
        if let Some(members) = self.by_dish.get_mut(dish) {
            members.remove(connection);
            if members.is_empty() {
                self.by_dish.remove(dish);
            }
        }
        if let Some(dishes) = self.by_connection.get_mut(connection) {
            dishes.remove(dish);
            if dishes.is_empty() {
                self.by_connection.remove(connection);
            }
        }
    }
}

/// Live connection outboxes and the per-dish groups they belong to
pub struct ConnectionRegistry {
    outboxes: RwLock<HashMap<ConnectionId, Outbox>>,
    groups: RwLock<Groups>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            outboxes: RwLock::new(HashMap::new()),
            groups: RwLock::new(Groups::default()),
        }
    }

    /// Open an outbox for a new connection. The transport drains the receiver.
    pub async fn register(&self, connection: ConnectionId) -> UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes.write().await.insert(connection, tx);
        rx
    }

    /// Close a connection's outbox and drop any group membership left behind.
    pub async fn unregister(&self, connection: &ConnectionId) {
        self.outboxes.write().await.remove(connection);

        let mut groups = self.groups.write().await;
        let Some(dishes) = groups.by_connection.remove(connection) else {
            return;
        };
        for dish in dishes {
            groups.remove(&dish, connection);
        }
    }

    /// Push a message to a single connection.
    pub async fn send_to(&self, connection: &ConnectionId, message: ServerMessage) -> Result<()> {
        let outboxes = self.outboxes.read().await;
        let outbox = outboxes
            .get(connection)
            .ok_or_else(|| ViewerError::ConnectionNotRegistered(connection.to_string()))?;
        outbox
            .send(message)
            .map_err(|_| ViewerError::BroadcastFailed(format!("outbox of {} is closed", connection)))
    }

    pub async fn connection_count(&self) -> usize {
        self.outboxes.read().await.len()
    }

    pub async fn group_count(&self) -> usize {
        self.groups.read().await.by_dish.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BroadcastPort for ConnectionRegistry {
    async fn join_group(&self, dish: &DishId, connection: &ConnectionId) -> Result<()> {
        if !self.outboxes.read().await.contains_key(connection) {
            return Err(ViewerError::ConnectionNotRegistered(connection.to_string()));
        }

        let mut groups = self.groups.write().await;
        groups.by_dish.entry(*dish).or_default().insert(connection.clone());
        groups
            .by_connection
            .entry(connection.clone())
            .or_default()
            .insert(*dish);
        Ok(())
    }

    async fn leave_group(&self, dish: &DishId, connection: &ConnectionId) -> Result<()> {
        self.groups.write().await.remove(dish, connection);
        Ok(())
    }

    async fn publish(&self, dish: &DishId, message: ServerMessage) -> Result<usize> {
        let members: Vec<ConnectionId> = match self.groups.read().await.by_dish.get(dish) {
            Some(members) => members.iter().cloned().collect(),
            None => return Ok(0),
        };

        let outboxes = self.outboxes.read().await;
        let mut delivered = 0;
        for member in &members {
            match outboxes.get(member) {
                Some(outbox) if outbox.send(message.clone()).is_ok() => delivered += 1,
                _ => log::debug!("Skipping {} for dish {}: outbox closed", member, dish),
            }
        }

        Ok(delivered)
    }
}
