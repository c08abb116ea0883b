use serde::Serialize;
use sse::{Connection, ConnectionId};

/// Public view of a live connection.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    pub id: ConnectionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl From<&Connection> for ClientSummary {
    fn from(connection: &Connection) -> Self {
        Self {
            id: connection.id().clone(),
            user_id: connection.user_id().map(str::to_owned),
        }
    }
}
