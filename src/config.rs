use crate::{
    event_dispatcher::DEFAULT_QUEUE_CAPACITY,
    hasher::{Murmur3Hasher, StableHasher},
    settings::AccountSettings,
    validator::DefaultValidator,
    BucketingSeeds, Client, EventTransport, Result, UserStorageService, Validator,
};

/// Configuration for [`Client`].
///
/// # Examples
/// ```
/// # use vwo::{ClientConfig, Event};
/// let client = ClientConfig::new(123456, "sdk-key")
///     .development_mode(true)
///     .event_transport(|event: &Event| {
///         println!("{:?}", event);
///         Ok::<_, vwo::Error>(())
///     })
///     .to_client();
/// ```
pub struct ClientConfig {
    pub(crate) account_id: u64,
    pub(crate) sdk_key: String,
    pub(crate) base_url: String,
    pub(crate) development_mode: bool,
    pub(crate) user_storage: Option<Box<dyn UserStorageService + Send + Sync>>,
    pub(crate) event_transport: Option<Box<dyn EventTransport + Send + Sync>>,
    pub(crate) event_queue_capacity: usize,
    pub(crate) validator: Box<dyn Validator + Send + Sync>,
    pub(crate) hasher: Box<dyn StableHasher + Send + Sync>,
    pub(crate) bucketing_seeds: BucketingSeeds,
    pub(crate) settings: Option<AccountSettings>,
}

impl ClientConfig {
    /// Create a default configuration for the given account.
    ///
    /// ```
    /// # use vwo::ClientConfig;
    /// ClientConfig::new(123456, "sdk-key");
    /// ```
    pub fn new(account_id: u64, sdk_key: impl Into<String>) -> Self {
        ClientConfig {
            account_id,
            sdk_key: sdk_key.into(),
            base_url: ClientConfig::DEFAULT_BASE_URL.to_owned(),
            development_mode: false,
            user_storage: None,
            event_transport: None,
            event_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            validator: Box::new(DefaultValidator),
            hasher: Box::new(Murmur3Hasher),
            bucketing_seeds: BucketingSeeds::default(),
            settings: None,
        }
    }

    /// Default base URL for API calls.
    pub const DEFAULT_BASE_URL: &'static str = "https://dev.visualwebsiteoptimizer.com";

    /// Override base URL for API calls. Clients should use the default setting in most cases.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// In development mode decisions are made as usual but events are marked as such and nothing
    /// is sent over HTTP.
    pub fn development_mode(mut self, development_mode: bool) -> Self {
        self.development_mode = development_mode;
        self
    }

    /// Set a storage plugin to make variation assignments sticky.
    pub fn user_storage(mut self, user_storage: impl UserStorageService + Send + Sync + 'static) -> Self {
        self.user_storage = Some(Box::new(user_storage));
        self
    }

    /// Replace the default event transport: HTTP, or
    /// [`NoopEventTransport`](crate::NoopEventTransport) in development mode.
    pub fn event_transport(
        mut self,
        event_transport: impl EventTransport + Send + Sync + 'static,
    ) -> Self {
        self.event_transport = Some(Box::new(event_transport));
        self
    }

    /// Maximum number of events waiting for delivery. Events dispatched while the queue is full
    /// are dropped. Defaults to 10 000.
    pub fn event_queue_capacity(mut self, event_queue_capacity: usize) -> Self {
        self.event_queue_capacity = event_queue_capacity;
        self
    }

    pub fn validator(mut self, validator: impl Validator + Send + Sync + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Replace the MurmurHash3 hasher. Only useful to stay compatible with a custom hashing
    /// scheme: every host bucketing the same users must use the same hasher and seeds.
    pub fn hasher(mut self, hasher: impl StableHasher + Send + Sync + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn bucketing_seeds(mut self, bucketing_seeds: BucketingSeeds) -> Self {
        self.bucketing_seeds = bucketing_seeds;
        self
    }

    /// Start with already loaded settings instead of waiting for [`Client::fetch_settings`].
    pub fn settings(mut self, settings: AccountSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// This starts the background thread delivering events.
    pub fn to_client(self) -> Result<Client> {
        Client::new(self)
    }
}
