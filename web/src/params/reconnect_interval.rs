use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateParams {
    /// Milliseconds a client waits before reconnecting a dropped stream.
    pub(crate) millis: u32,
}
