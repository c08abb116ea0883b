use serde::{Deserialize, Serialize};

/// Structured, pre-serialization form of one Server-Sent Events frame.
///
/// Built once with the `with_*` methods and then shared by reference across
/// every recipient of a send; nothing mutates it after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSentEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, rename = "event", skip_serializing_if = "Option::is_none")]
    event_type: Option<String>,
    #[serde(default)]
    data: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retry: Option<u32>,
}

impl ServerSentEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame carrying `text` as a single data line. Embedded line breaks are
    /// not split; use [`ServerSentEvent::with_data_lines`] for that.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new().with_data_line(text)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Appends one payload line verbatim.
    pub fn with_data_line(mut self, line: impl Into<String>) -> Self {
        self.data.push(line.into());
        self
    }

    /// Appends one payload line per line of `text`, accepting `\n` and `\r\n`.
    /// Empty lines are kept, so `""` is one empty line and `"a\n"` is two.
    pub fn with_data_lines(mut self, text: &str) -> Self {
        self.data.extend(
            text.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned()),
        );
        self
    }

    /// Appends `value` serialized as compact JSON on a single payload line.
    pub fn with_json_data<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(value)?;
        Ok(self.with_data_line(json))
    }

    pub fn with_retry(mut self, millis: u32) -> Self {
        self.retry = Some(millis);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn data(&self) -> &[String] {
        &self.data
    }

    pub fn retry(&self) -> Option<u32> {
        self.retry
    }
}
