//! HTTP client for the schedule API.

use tracing::{debug, instrument};

use super::{Room, ScheduleError, ScheduleItem};
use crate::config::FeedSettings;

const ROOMS_PATH: &str = "/rooms";
const SCHEDULE_PATH: &str = "/events/basicInfo/";

/// Read-only client for the schedule API.
///
/// Holds no per-request state; clones share the underlying connection pool
/// and can be used from concurrent commands.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    /// Builds a client from feed settings.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be initialized.
    pub fn new(settings: &FeedSettings) -> Result<Self, ScheduleError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the full event schedule, in the order the API returns it.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch_schedule(&self) -> Result<Vec<ScheduleItem>, ScheduleError> {
        let body = self.get(SCHEDULE_PATH).await?;
        let items = decode_schedule(&body)?;
        debug!("Fetched {} schedule items", items.len());
        Ok(items)
    }

    /// Fetches the room list with current occupancy.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch_rooms(&self) -> Result<Vec<Room>, ScheduleError> {
        let body = self.get(ROOMS_PATH).await?;
        let rooms = decode_rooms(&body)?;
        debug!("Fetched {} rooms", rooms.len());
        Ok(rooms)
    }

    /// Returns the body of a successful GET. Non-success statuses are `Transport` errors.
    async fn get(&self, path: &str) -> Result<Vec<u8>, ScheduleError> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {}", url);

        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Decodes a schedule payload.
pub fn decode_schedule(body: &[u8]) -> Result<Vec<ScheduleItem>, ScheduleError> {
    Ok(serde_json::from_slice(body)?)
}

/// Decodes a rooms payload.
pub fn decode_rooms(body: &[u8]) -> Result<Vec<Room>, ScheduleError> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::schedule::ActivityKind;

    /// Serves one canned HTTP response on a local port and returns settings pointing at it.
    async fn serve_once(status_line: &'static str, body: &'static str) -> FeedSettings {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        FeedSettings::with_base_url(format!("http://{addr}"))
    }

    const SCHEDULE_BODY: &str = r##"[
        {
            "id": 7,
            "is_active": true,
            "start_date_time": "2023-11-16T10:00:00+01:00",
            "end_date_time": "2023-11-16T10:45:00+01:00",
            "event": {
                "id": 3,
                "name": "Opening keynote",
                "display_description": true,
                "event_type": "SPEECH",
                "display_owner": null
            },
            "meeting_room": {
                "id": 1,
                "short_name": "AUDITORIO 1",
                "name": "Auditorio 1",
                "location": "Edificio Central",
                "capacity": 300,
                "color": "#c466ef",
                "occupancy": 85,
                "show_occupancy": true,
                "occupancy_editor": {
                    "id": 11,
                    "username": "sala1",
                    "is_staff": false,
                    "groups": []
                }
            }
        },
        {
            "id": 8,
            "is_active": false,
            "start_date_time": "2023-11-16T13:30:00+01:00",
            "end_date_time": "2023-11-16T14:30:00+01:00",
            "event": {"id": 4, "name": "Lunch", "event_type": "OTHER"},
            "meeting_room": null
        }
    ]"##;

    #[test]
    fn test_decode_schedule() {
        let items = decode_schedule(SCHEDULE_BODY.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);

        let keynote = &items[0];
        assert_eq!(keynote.id, 7);
        assert!(keynote.is_active);
        assert_eq!(keynote.activity.name, "Opening keynote");
        assert_eq!(keynote.activity.kind, ActivityKind::Speech);
        let room = keynote.room.as_ref().unwrap();
        assert_eq!(room.name, "Auditorio 1");
        assert_eq!(room.occupancy_percent, 85);
        assert_eq!(room.capacity, 300);

        assert!(items[1].room.is_none());
        assert_eq!(items[1].start_time.as_str(), "2023-11-16T13:30:00+01:00");
    }

    #[test]
    fn test_decode_schedule_null_end_time() {
        let body = r#"[{
            "id": 1,
            "is_active": true,
            "start_date_time": "2023-11-16T10:00:00Z",
            "end_date_time": null,
            "event": {"id": 1, "name": "Talk"}
        }]"#;
        let items = decode_schedule(body.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_active);
        assert_eq!(items[0].end_time.as_str(), "");
    }

    #[test]
    fn test_decode_schedule_keeps_bad_timestamps() {
        let body = r#"[{
            "id": 1,
            "is_active": false,
            "start_date_time": "not a time",
            "end_date_time": "",
            "event": {"id": 1, "name": "Mystery"}
        }]"#;
        let items = decode_schedule(body.as_bytes()).unwrap();
        assert_eq!(items[0].start_time.as_str(), "not a time");
    }

    #[test]
    fn test_decode_schedule_malformed_payload() {
        assert!(matches!(
            decode_schedule(b"{\"detail\": \"Not found.\"}"),
            Err(ScheduleError::Decode(_))
        ));
        assert!(matches!(
            decode_schedule(b"<html>502</html>"),
            Err(ScheduleError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rooms() {
        let body = r##"[
            {"id": 1, "short_name": "SALA CIRIA", "name": "Sala Ciria", "location": "Edificio Central",
             "capacity": 40, "color": "#eac344", "occupancy": 0, "show_occupancy": false,
             "occupancy_editor": 5},
            {"id": 2, "name": "Auditorio 2", "capacity": 120, "occupancy": 50}
        ]"##;
        let rooms = decode_rooms(body.as_bytes()).unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].short_name, "SALA CIRIA");
        assert_eq!(rooms[1].occupancy_percent, 50);
        assert!(!rooms[1].show_occupancy);
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = FeedClient::new(&FeedSettings::with_base_url("http://localhost:9/api/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9/api");
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_transport_error() {
        // Nothing listens on the discard port locally.
        let client = FeedClient::new(&FeedSettings::with_base_url("http://127.0.0.1:9")).unwrap();

        assert!(matches!(
            client.fetch_schedule().await,
            Err(ScheduleError::Transport(_))
        ));
        assert!(matches!(
            client.fetch_rooms().await,
            Err(ScheduleError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_schedule_ok() {
        let settings = serve_once("HTTP/1.1 200 OK", SCHEDULE_BODY).await;
        let client = FeedClient::new(&settings).unwrap();

        let items = client.fetch_schedule().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].activity.name, "Opening keynote");
    }

    #[tokio::test]
    async fn test_server_error_status_is_transport_error() {
        let settings = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;
        let client = FeedClient::new(&settings).unwrap();

        assert!(matches!(
            client.fetch_schedule().await,
            Err(ScheduleError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_decode_error() {
        let settings = serve_once("HTTP/1.1 200 OK", r#"{"detail":"x"}"#).await;
        let client = FeedClient::new(&settings).unwrap();

        assert!(matches!(
            client.fetch_rooms().await,
            Err(ScheduleError::Decode(_))
        ));
    }
}
