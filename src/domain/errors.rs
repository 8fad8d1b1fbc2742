use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    InvalidConnectionId,
    InvalidDishId(String),
    InvalidMessage(String),
    ConnectionNotRegistered(String),
    BroadcastFailed(String),
    Transport(String),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::InvalidConnectionId => write!(f, "Connection id must not be empty"),
            ViewerError::InvalidDishId(msg) => write!(f, "Invalid dish id: {}", msg),
            ViewerError::InvalidMessage(msg) => write!(f, "Invalid message: {}", msg),
            ViewerError::ConnectionNotRegistered(id) => write!(f, "Connection {} is not registered", id),
            ViewerError::BroadcastFailed(msg) => write!(f, "Broadcast failed: {}", msg),
            ViewerError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for ViewerError {}

pub type Result<T> = std::result::Result<T, ViewerError>;
