use rand::{thread_rng, Rng};
use reqwest::{StatusCode, Url};

use crate::{events::visitor_uuid, Error, Event, EventTransport, Result};

const SDK_NAME: &str = "vwo-rust-sdk";

/// Delivers events to the VWO collection endpoints over HTTP.
///
/// Events created in development mode are never sent.
pub struct HttpEventTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    sdk_key: String,
}

impl HttpEventTransport {
    pub fn new(base_url: impl Into<String>, sdk_key: impl Into<String>) -> Self {
        HttpEventTransport {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
            sdk_key: sdk_key.into(),
        }
    }

    /// Build the request URL for `event`.
    pub fn url(&self, event: &Event) -> Result<Url> {
        let account_id = event.account_id().to_string();
        let session_id = chrono::Utc::now().timestamp().to_string();
        let random = thread_rng().gen::<f64>().to_string();

        let mut params: Vec<(&str, String)> = vec![
            ("account_id", account_id),
            ("uId", event.user_id().to_owned()),
            ("u", visitor_uuid(event.account_id(), event.user_id())),
            ("sId", session_id),
            ("random", random),
            ("ap", "server".to_owned()),
            ("sdk", SDK_NAME.to_owned()),
            ("sdk-v", env!("CARGO_PKG_VERSION").to_owned()),
            ("env", self.sdk_key.clone()),
        ];

        match event {
            Event::TrackUser {
                campaign_id,
                variation_id,
                ..
            } => {
                params.push(("experiment_id", campaign_id.to_string()));
                params.push(("combination", variation_id.to_string()));
                params.push(("ed", r#"{"p":"server"}"#.to_owned()));
            }
            Event::TrackGoal {
                campaign_id,
                variation_id,
                goal_id,
                revenue_value,
                ..
            } => {
                params.push(("experiment_id", campaign_id.to_string()));
                params.push(("combination", variation_id.to_string()));
                params.push(("goal_id", goal_id.to_string()));
                if let Some(revenue) = revenue_value {
                    params.push(("r", revenue.clone()));
                }
            }
            Event::Push {
                tag_key, tag_value, ..
            } => {
                let mut tag = serde_json::Map::new();
                tag.insert(tag_key.clone(), tag_value.clone().into());
                let tags = serde_json::json!({ "u": tag });
                params.push(("tags", tags.to_string()));
            }
        }

        Url::parse_with_params(
            &format!("{}/server-side/{}", self.base_url, event.endpoint()),
            &params,
        )
        .map_err(Error::InvalidBaseUrl)
    }
}

impl EventTransport for HttpEventTransport {
    fn deliver(&self, event: &Event) -> Result<()> {
        if event.is_development_mode() {
            log::debug!(target: "vwo",
                        endpoint = event.endpoint(),
                        user_id = event.user_id();
                        "development mode, not sending event");
            return Ok(());
        }

        let url = self.url(event)?;
        let response = self.client.get(url).send()?;
        match response.status() {
            StatusCode::OK => {
                log::info!(target: "vwo",
                           endpoint = event.endpoint(),
                           user_id = event.user_id();
                           "event sent");
                Ok(())
            }
            status => Err(Error::UnexpectedStatus(status.as_u16())),
        }
    }
}
