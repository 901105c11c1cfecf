//! Account settings: the wire format served by the settings endpoint and the compiled,
//! immutable form decisions are made against.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    feature_variable::Variable,
    range_bucket::{RangeBucket, CAMPAIGN_DOMAIN, VARIATION_DOMAIN},
    segment::Segment,
    Result,
};

/// Account settings as served by the settings endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsWire {
    pub sdk_key: String,
    pub account_id: u64,
    #[serde(default)]
    pub version: u64,
    pub campaigns: Vec<TryParse<CampaignWire>>,
    /// Mutually-exclusive groups keyed by group id.
    #[serde(default)]
    pub groups: HashMap<String, GroupWire>,
}

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TryParse<T> {
    Parsed(T),
    ParseFailed(serde_json::Value),
}

impl<T> From<TryParse<T>> for Option<T> {
    fn from(value: TryParse<T>) -> Self {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignWire {
    pub id: u64,
    pub key: String,
    pub status: CampaignStatus,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub percent_traffic: f64,
    pub variations: Vec<VariationWire>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub segments: Segment,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationWire {
    pub id: u64,
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub is_feature_enabled: bool,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupWire {
    pub name: String,
    pub campaigns: Vec<u64>,
}

/// Campaign status. Only running campaigns bucket users.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Running,
    Paused,
    #[serde(other)]
    Other,
}

/// Campaign type, deciding which decision APIs may be used with the campaign.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignType {
    VisualAb,
    FeatureTest,
    FeatureRollout,
}

/// Goal type. Revenue goals can only be tracked together with a revenue value.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    RevenueTracking,
    CustomGoal,
    #[serde(other)]
    Other,
}

/// A conversion goal of a campaign.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: u64,
    pub identifier: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
}

impl Goal {
    pub fn is_revenue_type(&self) -> bool {
        self.goal_type == GoalType::RevenueTracking
    }
}

/// Compiled account settings. Immutable; replaced wholesale on refresh.
#[derive(Debug)]
pub struct AccountSettings {
    pub sdk_key: String,
    pub account_id: u64,
    pub version: u64,
    pub campaigns: Vec<BucketedCampaign>,
    pub groups: Vec<CampaignGroup>,
}

/// A campaign with its variations laid out in a [`RangeBucket`].
#[derive(Debug)]
pub struct BucketedCampaign {
    pub id: u64,
    pub key: String,
    pub status: CampaignStatus,
    pub campaign_type: CampaignType,
    pub percent_traffic: f64,
    /// Variations over the basis-point domain, in ascending id order.
    pub variations: RangeBucket<Variation>,
    /// Goals by identifier.
    pub goals: HashMap<String, Goal>,
    pub segments: Segment,
    pub variables: Vec<Variable>,
    /// The campaign alone over the percent domain. Used when the campaign is not grouped.
    pub(crate) traffic: RangeBucket<u64>,
    /// Index into [`AccountSettings::groups`].
    pub(crate) group: Option<usize>,
}

/// A variation (treatment arm) of a campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub id: u64,
    pub name: String,
    pub weight: f64,
    pub is_feature_enabled: bool,
    pub variables: Vec<Variable>,
}

/// Campaigns sharing one mutually-exclusive allocation scope.
#[derive(Debug)]
pub struct CampaignGroup {
    pub id: u64,
    pub name: String,
    /// Member campaign ids over the percent domain, in ascending id order.
    pub campaigns: RangeBucket<u64>,
}

impl AccountSettings {
    /// Parse and compile settings from JSON.
    pub fn from_json(json: &[u8]) -> Result<Self> {
        let wire: SettingsWire = serde_json::from_slice(json).map_err(|err| {
            log::warn!(target: "vwo", "failed to parse account settings: {err:?}");
            err
        })?;
        Ok(AccountSettings::new(wire))
    }

    /// Compile wire settings. Campaigns that failed to parse are skipped.
    pub fn new(wire: SettingsWire) -> Self {
        let mut campaigns: Vec<BucketedCampaign> = wire
            .campaigns
            .into_iter()
            .filter_map(|campaign| {
                let campaign: Option<CampaignWire> = campaign.into();
                if campaign.is_none() {
                    log::warn!(target: "vwo", "skipping campaign that failed to parse");
                }
                campaign
            })
            .map(compile_campaign)
            .collect();

        let mut groups: Vec<CampaignGroup> = Vec::with_capacity(wire.groups.len());
        let mut group_ids: Vec<(u64, GroupWire)> = wire
            .groups
            .into_iter()
            .filter_map(|(id, group)| match id.parse() {
                Ok(id) => Some((id, group)),
                Err(_) => {
                    log::warn!(target: "vwo", group_id:display = id; "skipping group with non-numeric id");
                    None
                }
            })
            .collect();
        group_ids.sort_by_key(|(id, _)| *id);

        for (id, mut group) in group_ids {
            group.campaigns.sort_unstable();
            let mut bucket = RangeBucket::new(CAMPAIGN_DOMAIN);
            for campaign_id in &group.campaigns {
                if let Some(campaign) = campaigns.iter_mut().find(|c| c.id == *campaign_id) {
                    bucket.add(campaign.percent_traffic, campaign.id);
                    campaign.group = Some(groups.len());
                }
            }
            groups.push(CampaignGroup {
                id,
                name: group.name,
                campaigns: bucket,
            });
        }

        AccountSettings {
            sdk_key: wire.sdk_key,
            account_id: wire.account_id,
            version: wire.version,
            campaigns,
            groups,
        }
    }

    /// The range bucket used to decide whether a user falls into `campaign`: the campaign's
    /// group when it has one, the campaign alone otherwise.
    pub(crate) fn allocation_scope<'a>(&'a self, campaign: &'a BucketedCampaign) -> &'a RangeBucket<u64> {
        campaign
            .group
            .and_then(|idx| self.groups.get(idx))
            .map_or(&campaign.traffic, |group| &group.campaigns)
    }
}

fn compile_campaign(campaign: CampaignWire) -> BucketedCampaign {
    let mut variations = campaign.variations;
    variations.sort_by_key(|v| v.id);

    let mut bucket = RangeBucket::new(VARIATION_DOMAIN);
    for variation in variations {
        let range = bucket.add(
            variation.weight,
            Variation {
                id: variation.id,
                name: variation.name,
                weight: variation.weight,
                is_feature_enabled: variation.is_feature_enabled,
                variables: variation.variables,
            },
        );
        log::debug!(target: "vwo",
                    campaign_key:display = campaign.key,
                    variation_name:display = range.item.name,
                    start = range.start,
                    end = range.end;
                    "variation range allocated");
    }

    let mut traffic = RangeBucket::new(CAMPAIGN_DOMAIN);
    traffic.add(campaign.percent_traffic, campaign.id);

    BucketedCampaign {
        id: campaign.id,
        key: campaign.key,
        status: campaign.status,
        campaign_type: campaign.campaign_type,
        percent_traffic: campaign.percent_traffic,
        variations: bucket,
        goals: campaign
            .goals
            .into_iter()
            .map(|goal| (goal.identifier.clone(), goal))
            .collect(),
        segments: campaign.segments,
        variables: campaign.variables,
        traffic,
        group: None,
    }
}

impl BucketedCampaign {
    pub fn is_running(&self) -> bool {
        self.status == CampaignStatus::Running
    }

    pub fn variation_by_name(&self, name: &str) -> Option<&Variation> {
        self.variations
            .ranges()
            .iter()
            .map(|range| &range.item)
            .find(|variation| variation.name == name)
    }

    /// The control variation: id 1 when present, the lowest id otherwise.
    pub fn control_variation(&self) -> Option<&Variation> {
        let ranges = self.variations.ranges();
        ranges
            .iter()
            .find(|range| range.item.id == 1)
            .or_else(|| ranges.first())
            .map(|range| &range.item)
    }

    pub fn goal(&self, identifier: &str) -> Option<&Goal> {
        self.goals.get(identifier)
    }
}
