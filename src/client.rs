use std::sync::Arc;

#[cfg(doc)]
use crate::Error;
use crate::{
    allocator::{CampaignAllocator, VariationAllocator},
    event_dispatcher::EventDispatcher,
    hasher::StableHasher,
    http_transport::HttpEventTransport,
    settings::{AccountSettings, BucketedCampaign, CampaignType, Goal, Variation},
    settings_fetcher::SettingsFetcher,
    settings_store::SettingsStore,
    user_storage::UserStorageAdapter,
    Attributes, BucketingSeeds, ClientConfig, Event, EventTransport, NoopEventTransport, Result,
    RevenueValue, Validator, VariableValue,
};

/// Maximum length of a tag key accepted by [`Client::push`].
pub const TAG_KEY_LENGTH: usize = 255;
/// Maximum length of a tag value accepted by [`Client::push`].
pub const TAG_VALUE_LENGTH: usize = 255;

/// A client for VWO server-side campaigns.
///
/// In order to create a client instance, first create [`ClientConfig`].
///
/// # Settings
///
/// Decisions are made against account settings. Either pass them upfront with
/// [`ClientConfig::settings`] or download them with [`Client::fetch_settings`]. Until settings
/// are available every decision is negative (`None`/`false`).
///
/// # Events
///
/// Decisions that report something (`activate`, `get_variation`, `track`, `is_feature_enabled`,
/// `push`) hand an [`Event`] to a background thread and return without waiting for delivery.
/// Call [`Client::shutdown`] to flush pending events before exiting.
///
/// # Examples
/// ```no_run
/// # use vwo::{Client, ClientConfig};
/// let client = ClientConfig::new(123456, "sdk-key").to_client()?;
/// client.fetch_settings()?;
///
/// if let Some(variation) = client.activate("campaign-key", "user-id", None) {
///     println!("user got {variation}");
/// }
/// client.shutdown()?;
/// # Ok::<(), vwo::Error>(())
/// ```
pub struct Client {
    account_id: u64,
    development_mode: bool,
    settings_store: SettingsStore,
    fetcher: SettingsFetcher,
    user_storage: UserStorageAdapter,
    validator: Box<dyn Validator + Send + Sync>,
    hasher: Box<dyn StableHasher + Send + Sync>,
    bucketing_seeds: BucketingSeeds,
    dispatcher: EventDispatcher,
}

/// Public operations, used to gate campaign types and to label logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Activate,
    GetVariation,
    Track,
    IsFeatureEnabled,
    GetFeatureVariableValue,
}

impl Api {
    fn name(self) -> &'static str {
        match self {
            Api::Activate => "activate",
            Api::GetVariation => "get_variation",
            Api::Track => "track",
            Api::IsFeatureEnabled => "is_feature_enabled",
            Api::GetFeatureVariableValue => "get_feature_variable_value",
        }
    }

    fn supports(self, campaign_type: CampaignType) -> bool {
        match self {
            Api::Activate => campaign_type == CampaignType::VisualAb,
            Api::GetVariation | Api::Track => campaign_type != CampaignType::FeatureRollout,
            Api::IsFeatureEnabled | Api::GetFeatureVariableValue => {
                campaign_type != CampaignType::VisualAb
            }
        }
    }
}

/// Outcome of one decision. `campaign` is only set once the user has been allocated to it.
#[derive(Debug, Default)]
struct UserAllocationInfo<'a> {
    campaign: Option<&'a BucketedCampaign>,
    variation: Option<&'a Variation>,
    goal: Option<&'a Goal>,
}

impl Client {
    /// Create a new `Client` using the specified configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBaseUrl`] if the configured base URL is not valid.
    /// - [`Error::Io`] if the event dispatcher thread could not be spawned.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let fetcher = SettingsFetcher::new(&config.base_url, config.account_id, &config.sdk_key)?;

        let transport: Box<dyn EventTransport + Send + Sync> = match config.event_transport {
            Some(transport) => transport,
            None if config.development_mode => Box::new(NoopEventTransport),
            None => Box::new(HttpEventTransport::new(
                config.base_url.clone(),
                config.sdk_key.clone(),
            )),
        };
        let dispatcher = EventDispatcher::start(transport, config.event_queue_capacity)?;

        let settings_store = SettingsStore::new();
        if let Some(settings) = config.settings {
            settings_store.set_settings(settings);
        }

        Ok(Client {
            account_id: config.account_id,
            development_mode: config.development_mode,
            settings_store,
            fetcher,
            user_storage: UserStorageAdapter::new(config.user_storage),
            validator: config.validator,
            hasher: config.hasher,
            bucketing_seeds: config.bucketing_seeds,
            dispatcher,
        })
    }

    /// Download account settings and use them for subsequent decisions.
    ///
    /// On error, previously loaded settings (if any) stay in use.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if the SDK key was rejected.
    /// - [`Error::Network`] or [`Error::UnexpectedStatus`] if the request failed.
    /// - [`Error::SettingsParseError`] if the response is not valid settings.
    pub fn fetch_settings(&self) -> Result<()> {
        let settings = self.fetcher.fetch()?;
        self.set_settings(settings);
        Ok(())
    }

    /// Replace the settings used for subsequent decisions. Decisions already running keep using
    /// the settings they started with.
    pub fn set_settings(&self, settings: AccountSettings) {
        log::debug!(target: "vwo",
                    account_id = settings.account_id,
                    version = settings.version;
                    "installing account settings");
        self.settings_store.set_settings(settings);
    }

    /// Currently loaded settings.
    pub fn settings(&self) -> Option<Arc<AccountSettings>> {
        self.settings_store.get_settings()
    }

    /// Bucket the user into a `VISUAL_AB` campaign and report the impression.
    ///
    /// Returns the name of the variation the user got, or `None` if the user is not part of the
    /// campaign.
    ///
    /// # Examples
    /// ```
    /// # fn test(client: &vwo::Client) {
    /// let attributes: vwo::Attributes = [("browser".to_owned(), "chrome".into())].into();
    /// let variation = client.activate("campaign-key", "user-id", Some(&attributes));
    /// # }
    /// ```
    pub fn activate(
        &self,
        campaign_key: &str,
        user_id: &str,
        custom_variables: Option<&Attributes>,
    ) -> Option<String> {
        if !self.validator.activate(campaign_key, user_id) {
            log::warn!(target: "vwo", campaign_key, user_id; "activate called with invalid arguments");
            return None;
        }
        let settings = self.settings_for(Api::Activate, campaign_key, user_id)?;
        let info = self.allocate(
            &settings,
            Api::Activate,
            campaign_key,
            user_id,
            custom_variables,
            None,
        );

        let (campaign, variation) = (info.campaign?, info.variation?);
        self.track_user(&settings, campaign, variation, user_id);
        Some(variation.name.clone())
    }

    /// Same as [`Client::activate`], also available for `FEATURE_TEST` campaigns. The impression
    /// is reported whenever the user gets a variation.
    pub fn get_variation(
        &self,
        campaign_key: &str,
        user_id: &str,
        custom_variables: Option<&Attributes>,
    ) -> Option<String> {
        if !self.validator.get_variation(campaign_key, user_id) {
            log::warn!(target: "vwo", campaign_key, user_id; "get_variation called with invalid arguments");
            return None;
        }
        let settings = self.settings_for(Api::GetVariation, campaign_key, user_id)?;
        let info = self.allocate(
            &settings,
            Api::GetVariation,
            campaign_key,
            user_id,
            custom_variables,
            None,
        );

        let (campaign, variation) = (info.campaign?, info.variation?);
        self.track_user(&settings, campaign, variation, user_id);
        Some(variation.name.clone())
    }

    /// Report a conversion of `goal_identifier` for a user bucketed into the campaign.
    ///
    /// Revenue goals require a non-empty `revenue_value`; it is ignored for other goals. Returns
    /// `true` if a conversion was reported.
    ///
    /// # Examples
    /// ```
    /// # fn test(client: &vwo::Client) {
    /// client.track("campaign-key", "user-id", "signup", None, None);
    /// client.track("campaign-key", "user-id", "purchase", Some(19.99_f64.into()), None);
    /// client.track("campaign-key", "user-id", "purchase", Some("19.99".into()), None);
    /// # }
    /// ```
    pub fn track(
        &self,
        campaign_key: &str,
        user_id: &str,
        goal_identifier: &str,
        revenue_value: Option<RevenueValue>,
        custom_variables: Option<&Attributes>,
    ) -> bool {
        if !self.validator.track(campaign_key, user_id, goal_identifier) {
            log::warn!(target: "vwo", campaign_key, user_id, goal_identifier; "track called with invalid arguments");
            return false;
        }
        let Some(settings) = self.settings_for(Api::Track, campaign_key, user_id) else {
            return false;
        };
        let info = self.allocate(
            &settings,
            Api::Track,
            campaign_key,
            user_id,
            custom_variables,
            Some(goal_identifier),
        );

        let (Some(campaign), Some(variation)) = (info.campaign, info.variation) else {
            return false;
        };
        let Some(goal) = info.goal else {
            log::warn!(target: "vwo", campaign_key, user_id, goal_identifier; "goal not found in campaign");
            return false;
        };
        let revenue_value = revenue_value.and_then(RevenueValue::into_param);
        if goal.is_revenue_type() && revenue_value.is_none() {
            log::warn!(target: "vwo", campaign_key, user_id, goal_identifier; "revenue goal tracked without revenue value");
            return false;
        }

        self.dispatcher.dispatch(Event::TrackGoal {
            account_id: settings.account_id,
            campaign_id: campaign.id,
            variation_id: variation.id,
            user_id: user_id.to_owned(),
            goal_id: goal.id,
            revenue_value: revenue_value.filter(|_| goal.is_revenue_type()),
            development_mode: self.development_mode,
        });
        true
    }

    /// Whether the feature behind a `FEATURE_TEST` or `FEATURE_ROLLOUT` campaign is on for the
    /// user.
    ///
    /// Feature tests report the impression whatever the answer is. Rollouts report nothing.
    pub fn is_feature_enabled(
        &self,
        campaign_key: &str,
        user_id: &str,
        custom_variables: Option<&Attributes>,
    ) -> bool {
        if !self.validator.is_feature_enabled(campaign_key, user_id) {
            log::warn!(target: "vwo", campaign_key, user_id; "is_feature_enabled called with invalid arguments");
            return false;
        }
        let Some(settings) = self.settings_for(Api::IsFeatureEnabled, campaign_key, user_id)
        else {
            return false;
        };
        let info = self.allocate(
            &settings,
            Api::IsFeatureEnabled,
            campaign_key,
            user_id,
            custom_variables,
            None,
        );

        let Some(campaign) = info.campaign else {
            return false;
        };
        let enabled = match campaign.campaign_type {
            CampaignType::FeatureRollout => true,
            CampaignType::FeatureTest => match info.variation {
                Some(variation) => {
                    self.track_user(&settings, campaign, variation, user_id);
                    variation.is_feature_enabled
                }
                None => false,
            },
            CampaignType::VisualAb => false,
        };

        log::info!(target: "vwo", campaign_key, user_id, enabled; "feature flag evaluated");
        enabled
    }

    /// Value of the feature variable `variable_key` for the user.
    ///
    /// Rollouts read the campaign's variables. Feature tests read the variables of the user's
    /// variation, or of the control variation when the feature is off in that variation.
    ///
    /// # Examples
    /// ```
    /// # fn test(client: &vwo::Client) {
    /// let color = client
    ///     .get_feature_variable_value("feature-key", "color", "user-id", None)
    ///     .as_ref()
    ///     .and_then(|value| value.as_str().map(str::to_owned))
    ///     .unwrap_or_else(|| "blue".to_owned());
    /// # }
    /// ```
    pub fn get_feature_variable_value(
        &self,
        campaign_key: &str,
        variable_key: &str,
        user_id: &str,
        custom_variables: Option<&Attributes>,
    ) -> Option<VariableValue> {
        if !self
            .validator
            .get_feature_variable_value(campaign_key, variable_key, user_id)
        {
            log::warn!(target: "vwo", campaign_key, variable_key, user_id; "get_feature_variable_value called with invalid arguments");
            return None;
        }
        let settings = self.settings_for(Api::GetFeatureVariableValue, campaign_key, user_id)?;
        let info = self.allocate(
            &settings,
            Api::GetFeatureVariableValue,
            campaign_key,
            user_id,
            custom_variables,
            None,
        );

        let campaign = info.campaign?;
        let variables = match campaign.campaign_type {
            CampaignType::FeatureRollout => &campaign.variables,
            CampaignType::FeatureTest => {
                let variation = info.variation?;
                if variation.is_feature_enabled {
                    &variation.variables
                } else {
                    log::info!(target: "vwo",
                               campaign_key,
                               user_id,
                               variation_name:display = variation.name;
                               "feature is off in variation, using control variables");
                    &campaign.control_variation()?.variables
                }
            }
            CampaignType::VisualAb => return None,
        };

        let Some(variable) = variables.iter().find(|v| v.key == variable_key) else {
            log::warn!(target: "vwo", campaign_key, variable_key, user_id; "feature variable not found");
            return None;
        };
        let value = variable.typed_value();
        log::info!(target: "vwo",
                   campaign_key,
                   variable_key,
                   user_id;
                   "feature variable value: {value:?}");
        value
    }

    /// Set a custom dimension for the user. Returns `true` if the tag was reported.
    ///
    /// Keys longer than [`TAG_KEY_LENGTH`] and values longer than [`TAG_VALUE_LENGTH`]
    /// characters are rejected.
    pub fn push(&self, tag_key: &str, tag_value: &str, user_id: &str) -> bool {
        if !self.validator.push(tag_key, tag_value, user_id) {
            log::warn!(target: "vwo", tag_key, user_id; "push called with invalid arguments");
            return false;
        }
        if tag_key.chars().count() > TAG_KEY_LENGTH {
            log::warn!(target: "vwo", user_id; "tag key exceeds {TAG_KEY_LENGTH} characters");
            return false;
        }
        if tag_value.chars().count() > TAG_VALUE_LENGTH {
            log::warn!(target: "vwo", tag_key, user_id; "tag value exceeds {TAG_VALUE_LENGTH} characters");
            return false;
        }

        self.dispatcher.dispatch(Event::Push {
            account_id: self.account_id,
            tag_key: tag_key.to_owned(),
            tag_value: tag_value.to_owned(),
            user_id: user_id.to_owned(),
            development_mode: self.development_mode,
        });
        true
    }

    /// Stop the event dispatcher, blocking until every pending event has been delivered.
    ///
    /// # Errors
    ///
    /// [`Error::DispatcherThreadPanicked`] if the transport panicked while delivering.
    pub fn shutdown(self) -> Result<()> {
        self.dispatcher.shutdown()
    }

    fn settings_for(
        &self,
        api: Api,
        campaign_key: &str,
        user_id: &str,
    ) -> Option<Arc<AccountSettings>> {
        let settings = self.settings_store.get_settings();
        if settings.is_none() {
            log::warn!(target: "vwo",
                       api = api.name(),
                       campaign_key,
                       user_id;
                       "making a decision before account settings have been loaded");
        }
        settings
    }

    /// Run the shared decision sequence: resolve campaign, gate on status and type, apply
    /// segmentation, then allocate campaign and variation (sticky record first) and persist the
    /// result.
    fn allocate<'s>(
        &self,
        settings: &'s AccountSettings,
        api: Api,
        campaign_key: &str,
        user_id: &str,
        custom_variables: Option<&Attributes>,
        goal_identifier: Option<&str>,
    ) -> UserAllocationInfo<'s> {
        let campaigns = CampaignAllocator {
            hasher: &*self.hasher,
            seed: self.bucketing_seeds.campaign,
        };
        let variations = VariationAllocator {
            hasher: &*self.hasher,
            seed: self.bucketing_seeds.variation,
        };

        let Some(campaign) = campaigns.get_campaign(settings, campaign_key) else {
            log::warn!(target: "vwo", api = api.name(), campaign_key, user_id; "campaign not found");
            return UserAllocationInfo::default();
        };
        if !campaign.is_running() {
            log::warn!(target: "vwo",
                       api = api.name(),
                       campaign_key,
                       user_id,
                       status:debug = campaign.status;
                       "campaign is not running");
            return UserAllocationInfo::default();
        }
        if !api.supports(campaign.campaign_type) {
            log::warn!(target: "vwo",
                       api = api.name(),
                       campaign_key,
                       campaign_type:debug = campaign.campaign_type;
                       "api cannot be used with this campaign type");
            return UserAllocationInfo::default();
        }

        if campaign.segments.is_empty() {
            log::info!(target: "vwo", campaign_key, user_id; "no segmentation, skipping pre-segmentation");
        } else {
            let empty = Attributes::new();
            let attributes = custom_variables.unwrap_or_else(|| {
                log::info!(target: "vwo", campaign_key, user_id; "no custom variables passed for segmentation");
                &empty
            });
            if !campaign.segments.eval(attributes) {
                log::info!(target: "vwo", campaign_key, user_id; "user failed pre-segmentation");
                return UserAllocationInfo::default();
            }
        }

        let sticky = self.user_storage.lookup(user_id, campaign_key);

        let Some(campaign) = campaigns.allocate(settings, sticky.as_ref(), campaign_key, user_id)
        else {
            log::info!(target: "vwo", campaign_key, user_id; "user is not part of the campaign");
            return UserAllocationInfo::default();
        };
        let goal = goal_identifier.and_then(|identifier| campaign.goal(identifier));

        let Some(variation) = variations.allocate(sticky.as_ref(), campaign, user_id) else {
            log::info!(target: "vwo", campaign_key, user_id; "user did not get any variation");
            return UserAllocationInfo {
                campaign: Some(campaign),
                variation: None,
                goal,
            };
        };

        log::info!(target: "vwo",
                   api = api.name(),
                   campaign_key,
                   user_id,
                   variation_name:display = variation.name;
                   "user got variation");

        let already_stored = sticky
            .as_ref()
            .is_some_and(|record| record.variation_name == variation.name);
        if !already_stored {
            self.user_storage.save(user_id, campaign_key, &variation.name);
        }

        UserAllocationInfo {
            campaign: Some(campaign),
            variation: Some(variation),
            goal,
        }
    }

    fn track_user(
        &self,
        settings: &AccountSettings,
        campaign: &BucketedCampaign,
        variation: &Variation,
        user_id: &str,
    ) {
        self.dispatcher.dispatch(Event::TrackUser {
            account_id: settings.account_id,
            campaign_id: campaign.id,
            variation_id: variation.id,
            user_id: user_id.to_owned(),
            development_mode: self.development_mode,
        });
    }
}
