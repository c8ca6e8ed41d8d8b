//! Change-feed transport.
//!
//! The backend streams row changes over a long-lived HTTP response at
//! `{url}/realtime/v1/stream`, one JSON event per line (NDJSON). Opening a
//! feed spawns a reader task that parses lines into [`ChangeEvent`]s and
//! forwards them on an in-process channel; the [`FeedChannel`] handed back
//! owns both ends of that plumbing.
//!
//! There is no reconnect, replay, or ordering logic here: a dropped
//! connection simply ends the reader task and the channel runs dry. Whoever
//! wants notifications again opens a new feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use secrecy::ExposeSecret;

use super::{Backend, BackendError};

/// What happened to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One normalized change notification.
///
/// INSERT and UPDATE carry `new`; UPDATE and DELETE carry `old`. At least
/// one of the two is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
}

/// Restrict a feed to rows where `column` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowPredicate {
    pub column: String,
    pub value: String,
}

impl RowPredicate {
    /// A `column = value` predicate.
    #[must_use]
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// What a feed listens to: one table, optionally narrowed to matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedFilter {
    pub table: String,
    pub predicate: Option<RowPredicate>,
}

impl FeedFilter {
    /// All changes on `table`.
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            predicate: None,
        }
    }

    /// Narrow the feed to rows matching `predicate`.
    #[must_use]
    pub fn with_predicate(mut self, predicate: RowPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// The channel name this filter subscribes under; also the key the
    /// subscription registry tracks it by.
    #[must_use]
    pub fn channel_name(&self) -> String {
        match &self.predicate {
            Some(p) => format!("{}:{}=eq.{}", self.table, p.column, p.value),
            None => format!("{}:*", self.table),
        }
    }
}

/// An open change-feed channel.
///
/// Events arrive in whatever order the backend emits them. Close it exactly
/// once with [`FeedChannel::close`]; closing again is harmless.
pub struct FeedChannel {
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    reader: Option<JoinHandle<()>>,
}

impl FeedChannel {
    pub(crate) fn from_parts(
        events: mpsc::UnboundedReceiver<ChangeEvent>,
        reader: Option<JoinHandle<()>>,
    ) -> Self {
        Self { events, reader }
    }

    /// Wait for the next event. `None` means the feed has ended (closed, or
    /// the connection dropped).
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Tear the channel down. Idempotent.
    pub fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.events.close();
    }
}

impl Drop for FeedChannel {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl std::fmt::Debug for FeedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedChannel")
            .field("open", &self.reader.is_some())
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// Open a change feed for the rows selected by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unconfigured, the connection cannot
    /// be established, or the backend rejects the stream request. Once open,
    /// failures are silent: the feed just ends.
    #[instrument(skip(self), fields(channel = %filter.channel_name()))]
    pub async fn open_feed(&self, filter: &FeedFilter) -> Result<FeedChannel, BackendError> {
        let inner = self.inner()?;

        let mut params = vec![("table".to_string(), filter.table.clone())];
        if let Some(p) = &filter.predicate {
            params.push((p.column.clone(), format!("eq.{}", p.value)));
        }

        let response = inner
            .client
            .get(Self::endpoint(inner, "realtime/v1/stream"))
            .query(&params)
            .header("apikey", inner.anon_key.expose_secret())
            .header("Accept", "application/x-ndjson")
            .bearer_auth(Self::bearer_token(inner).await)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status,
                message: message.chars().take(500).collect(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let channel = filter.channel_name();
        let reader = tokio::spawn(read_lines(response, tx, channel));

        Ok(FeedChannel::from_parts(rx, Some(reader)))
    }
}

/// Pump NDJSON lines from the response body into the channel until the
/// connection drops or the receiver goes away.
async fn read_lines(
    mut response: reqwest::Response,
    tx: mpsc::UnboundedSender<ChangeEvent>,
    channel: String,
) {
    let mut buffer: Vec<u8> = Vec::new();

    loop {
        match response.chunk().await {
            Ok(Some(bytes)) => {
                buffer.extend_from_slice(&bytes);
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();
                    if line.is_empty() {
                        // keepalive
                        continue;
                    }
                    match serde_json::from_str::<ChangeEvent>(line) {
                        Ok(event) => {
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                        Err(error) => {
                            debug!(%channel, %error, "skipping unparseable feed line");
                        }
                    }
                }
            }
            Ok(None) => {
                debug!(%channel, "change feed ended");
                return;
            }
            Err(error) => {
                debug!(%channel, %error, "change feed connection dropped");
                return;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(FeedFilter::table("products").channel_name(), "products:*");
        assert_eq!(
            FeedFilter::table("orders")
                .with_predicate(RowPredicate::eq("user_id", "abc"))
                .channel_name(),
            "orders:user_id=eq.abc"
        );
    }

    #[test]
    fn test_change_event_wire_format() {
        let json = r#"{"type":"UPDATE","table":"products","new":{"id":"x","stock":5},"old":{"id":"x","stock":7}}"#;
        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.table, "products");
        assert!(event.new.is_some());
        assert!(event.old.is_some());

        let json = r#"{"type":"DELETE","table":"products","old":{"id":"x"}}"#;
        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, ChangeKind::Delete);
        assert!(event.new.is_none());
    }

    #[tokio::test]
    async fn test_from_parts_delivers_and_closes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut channel = FeedChannel::from_parts(rx, None);

        tx.send(ChangeEvent {
            kind: ChangeKind::Insert,
            table: "products".to_string(),
            new: Some(serde_json::json!({"id": "p1"})),
            old: None,
        })
        .unwrap();

        let event = channel.next_event().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);

        channel.close();
        channel.close(); // idempotent
        assert!(tx.send(ChangeEvent {
            kind: ChangeKind::Delete,
            table: "products".to_string(),
            new: None,
            old: Some(serde_json::json!({"id": "p1"})),
        })
        .is_err());
    }

    #[tokio::test]
    async fn test_open_feed_unconfigured_errors() {
        let backend = Backend::unconfigured();
        let result = backend.open_feed(&FeedFilter::table("products")).await;
        assert!(matches!(result, Err(BackendError::Unconfigured)));
    }
}
