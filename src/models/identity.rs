use serde::{Deserialize, Serialize};

/// The user identity published after a full token rotation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    /// Mirrors `user_id`; the front token carries no separate display name.
    pub username: String,
}

impl Identity {
    pub fn new(user_id: String, email: Option<String>) -> Self {
        Identity {
            username: user_id.clone(),
            user_id,
            email,
        }
    }
}
