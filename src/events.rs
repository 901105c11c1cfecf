//! Impression, conversion and tag events produced by decisions.
use derive_more::From;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// An event to report to the collection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A user was bucketed into a variation.
    TrackUser {
        account_id: u64,
        campaign_id: u64,
        variation_id: u64,
        user_id: String,
        development_mode: bool,
    },
    /// A user converted on a goal.
    TrackGoal {
        account_id: u64,
        campaign_id: u64,
        variation_id: u64,
        user_id: String,
        goal_id: u64,
        revenue_value: Option<String>,
        development_mode: bool,
    },
    /// A custom dimension was set for a user.
    Push {
        account_id: u64,
        tag_key: String,
        tag_value: String,
        user_id: String,
        development_mode: bool,
    },
}

impl Event {
    /// Path segment of the collection endpoint, relative to `/server-side/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Event::TrackUser { .. } => "track-user",
            Event::TrackGoal { .. } => "track-goal",
            Event::Push { .. } => "push",
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Event::TrackUser { user_id, .. }
            | Event::TrackGoal { user_id, .. }
            | Event::Push { user_id, .. } => user_id,
        }
    }

    pub fn account_id(&self) -> u64 {
        match self {
            Event::TrackUser { account_id, .. }
            | Event::TrackGoal { account_id, .. }
            | Event::Push { account_id, .. } => *account_id,
        }
    }

    pub fn is_development_mode(&self) -> bool {
        match self {
            Event::TrackUser {
                development_mode, ..
            }
            | Event::TrackGoal {
                development_mode, ..
            }
            | Event::Push {
                development_mode, ..
            } => *development_mode,
        }
    }
}

/// Revenue reported with a conversion on a revenue goal.
///
/// ```
/// # use vwo::RevenueValue;
/// let revenue: RevenueValue = "19.99".into();
/// let revenue: RevenueValue = 20_i64.into();
/// let revenue: RevenueValue = 19.99_f64.into();
/// ```
#[derive(Debug, Clone, PartialEq, From)]
pub enum RevenueValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<&str> for RevenueValue {
    fn from(value: &str) -> Self {
        RevenueValue::Text(value.to_owned())
    }
}

impl RevenueValue {
    /// Value of the `r` query parameter. Blank text counts as no revenue.
    pub(crate) fn into_param(self) -> Option<String> {
        match self {
            RevenueValue::Text(text) if text.trim().is_empty() => None,
            RevenueValue::Text(text) => Some(text),
            RevenueValue::Integer(value) => Some(value.to_string()),
            RevenueValue::Float(value) if value.is_finite() => Some(value.to_string()),
            RevenueValue::Float(_) => None,
        }
    }
}

/// Delivers events to wherever the host wants them.
///
/// Delivery runs on the dispatcher thread, never on the thread making the decision. Errors are
/// logged and dropped.
///
/// Any `Fn(&Event) -> Result<()>` closure is a transport:
/// ```
/// # use vwo::{ClientConfig, Event};
/// let config = ClientConfig::new(123456, "sdk-key").event_transport(|event: &Event| {
///     println!("{event:?}");
///     Ok::<_, vwo::Error>(())
/// });
/// ```
pub trait EventTransport {
    fn deliver(&self, event: &Event) -> Result<()>;
}

/// Transport that drops every event. Used by default in development mode.
pub struct NoopEventTransport;

impl EventTransport for NoopEventTransport {
    fn deliver(&self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

impl<T: Fn(&Event) -> Result<()>> EventTransport for T {
    fn deliver(&self, event: &Event) -> Result<()> {
        self(event)
    }
}

/// Visitor id reported with events: a UUIDv5 derived from the account id and then the user id,
/// as 32 uppercase hex digits.
pub fn visitor_uuid(account_id: u64, user_id: &str) -> String {
    let vwo_namespace = Uuid::new_v5(&Uuid::NAMESPACE_URL, b"https://vwo.com");
    let account_namespace = Uuid::new_v5(&vwo_namespace, account_id.to_string().as_bytes());
    Uuid::new_v5(&account_namespace, user_id.as_bytes())
        .simple()
        .to_string()
        .to_uppercase()
}
