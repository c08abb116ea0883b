use serde::Serialize;
pub(crate) mod client_controller;
pub(crate) mod event_controller;
pub(crate) mod health_check_controller;
pub(crate) mod reconnect_interval_controller;

/// JSON envelope shared by every controller that returns a body.
#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }
}
