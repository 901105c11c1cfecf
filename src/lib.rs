//! The Rust SDK for VWO server-side A/B testing, feature tests and feature rollouts.
//!
//! # Overview
//!
//! The SDK revolves around a [`Client`] that decides, for a user id and a campaign key, whether
//! the user takes part in the campaign and which variation they get. Decisions are made locally
//! against account settings and are deterministic: every host using the same settings puts a
//! user into the same variation.
//!
//! A decision runs through these steps:
//! 1. the campaign is looked up and must be running and of a type the operation supports;
//! 2. the campaign's [`Segment`] tree is evaluated against the user's [`Attributes`];
//! 3. the user is hashed into the campaign (or its mutually-exclusive group) and then into one
//!    of its variations, unless a [`UserStorageService`] already remembers a variation;
//! 4. the outcome is stored and an [`Event`] is handed to the background dispatcher.
//!
//! # Error Handling
//!
//! Decision operations never fail: a user that cannot be bucketed gets `None` or `false`.
//! Setting up the client and fetching settings return [`Result`] with the [`Error`] enum.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging messages, all
//! under the `vwo` target. Consider integrating a `log`-compatible logger implementation for
//! better visibility into SDK decisions.
//!
//! # Examples
//!
//! Examples can be found in the `demos/` directory of the `vwo` crate repository.

#![warn(rustdoc::missing_crate_level_docs)]

mod allocator;
mod attributes;
mod client;
mod config;
mod error;
mod event_dispatcher;
mod events;
mod feature_variable;
mod hasher;
mod http_transport;
mod operand;
mod range_bucket;
mod segment;
pub mod settings;
mod settings_fetcher;
mod settings_store;
mod user_storage;
mod validator;

pub use allocator::BucketingSeeds;
pub use attributes::{AttributeValue, Attributes};
pub use client::{Client, TAG_KEY_LENGTH, TAG_VALUE_LENGTH};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use events::{visitor_uuid, Event, EventTransport, NoopEventTransport, RevenueValue};
pub use feature_variable::{RawValue, Variable, VariableType, VariableValue};
pub use hasher::{Murmur3Hasher, StableHasher};
pub use http_transport::HttpEventTransport;
pub use range_bucket::{Range, RangeBucket, CAMPAIGN_DOMAIN, VARIATION_DOMAIN};
pub use segment::Segment;
pub use settings::AccountSettings;
pub use user_storage::{UserStorageRecord, UserStorageService};
pub use validator::{DefaultValidator, Validator};
