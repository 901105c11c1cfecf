//! Deterministic placement of users into campaigns and variations.
use crate::{
    hasher::StableHasher,
    range_bucket::{CAMPAIGN_DOMAIN, VARIATION_DOMAIN},
    settings::{AccountSettings, BucketedCampaign, Variation},
    UserStorageRecord,
};

/// Hash seeds used for the two allocation steps. Using different seeds keeps the campaign and
/// variation decisions independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketingSeeds {
    pub campaign: u32,
    pub variation: u32,
}

impl Default for BucketingSeeds {
    fn default() -> Self {
        BucketingSeeds {
            campaign: 1,
            variation: 2,
        }
    }
}

/// Decides whether a user takes part in a campaign.
pub(crate) struct CampaignAllocator<'a> {
    pub hasher: &'a dyn StableHasher,
    pub seed: u32,
}

impl<'a> CampaignAllocator<'a> {
    pub fn get_campaign<'s>(
        &self,
        settings: &'s AccountSettings,
        campaign_key: &str,
    ) -> Option<&'s BucketedCampaign> {
        settings.campaigns.iter().find(|c| c.key == campaign_key)
    }

    /// Allocate `user_id` to the campaign named `campaign_key`.
    ///
    /// A sticky record for the campaign wins without hashing. Otherwise the user is hashed over
    /// the campaign's allocation scope (its group, or the campaign alone) and takes part only if
    /// the range found belongs to this campaign.
    pub fn allocate<'s>(
        &self,
        settings: &'s AccountSettings,
        sticky: Option<&UserStorageRecord>,
        campaign_key: &str,
        user_id: &str,
    ) -> Option<&'s BucketedCampaign> {
        let campaign = self.get_campaign(settings, campaign_key)?;

        if sticky.is_some_and(|record| record.campaign_key == campaign.key) {
            log::debug!(target: "vwo", campaign_key, user_id; "using stored campaign allocation");
            return Some(campaign);
        }

        let bucket_value = self
            .hasher
            .bucket_value(self.seed, user_id, CAMPAIGN_DOMAIN);
        let allocated = settings.allocation_scope(campaign).find(bucket_value);

        log::debug!(target: "vwo",
                    campaign_key,
                    user_id,
                    bucket_value,
                    allocated:debug = allocated;
                    "campaign bucket computed");

        match allocated {
            Some(id) if *id == campaign.id => Some(campaign),
            _ => None,
        }
    }
}

/// Picks a variation for a user already allocated to a campaign.
pub(crate) struct VariationAllocator<'a> {
    pub hasher: &'a dyn StableHasher,
    pub seed: u32,
}

impl<'a> VariationAllocator<'a> {
    /// A sticky record naming an existing variation is honored. Otherwise the user is hashed over
    /// the variation ranges.
    pub fn allocate<'c>(
        &self,
        sticky: Option<&UserStorageRecord>,
        campaign: &'c BucketedCampaign,
        user_id: &str,
    ) -> Option<&'c Variation> {
        if let Some(record) = sticky {
            match campaign.variation_by_name(&record.variation_name) {
                Some(variation) => return Some(variation),
                None => {
                    log::warn!(target: "vwo",
                               campaign_key:display = campaign.key,
                               user_id,
                               variation_name:display = record.variation_name;
                               "stored variation no longer exists, bucketing again");
                }
            }
        }

        let bucket_value = self
            .hasher
            .bucket_value(self.seed, user_id, VARIATION_DOMAIN);
        let variation = campaign.variations.find(bucket_value);

        log::debug!(target: "vwo",
                    campaign_key:display = campaign.key,
                    user_id,
                    bucket_value;
                    "variation bucket computed: {:?}", variation.map(|v| &v.name));

        variation
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use proptest::prelude::*;

    use super::{BucketingSeeds, CampaignAllocator, VariationAllocator};
    use crate::{
        hasher::{tests::CountingHasher, Murmur3Hasher, StableHasher},
        range_bucket::{CAMPAIGN_DOMAIN, VARIATION_DOMAIN},
        settings::AccountSettings,
        UserStorageRecord,
    };

    fn fixture() -> AccountSettings {
        AccountSettings::from_json(&fs::read("tests/data/settings.json").unwrap()).unwrap()
    }

    fn campaigns(hasher: &dyn StableHasher) -> CampaignAllocator<'_> {
        CampaignAllocator {
            hasher,
            seed: BucketingSeeds::default().campaign,
        }
    }

    fn variations(hasher: &dyn StableHasher) -> VariationAllocator<'_> {
        VariationAllocator {
            hasher,
            seed: BucketingSeeds::default().variation,
        }
    }

    fn sticky(campaign_key: &str, variation_name: &str) -> UserStorageRecord {
        UserStorageRecord {
            user_id: "u1".into(),
            campaign_key: campaign_key.into(),
            variation_name: variation_name.into(),
        }
    }

    #[test]
    fn unknown_campaign_is_not_allocated() {
        let settings = fixture();
        assert!(campaigns(&Murmur3Hasher)
            .allocate(&settings, None, "missing", "u1")
            .is_none());
    }

    #[test]
    fn full_traffic_allocates_everyone() {
        let settings = fixture();
        let allocator = campaigns(&Murmur3Hasher);
        for i in 0..100 {
            let user = format!("user-{i}");
            let campaign = allocator
                .allocate(&settings, None, "ab_campaign", &user)
                .unwrap();
            assert_eq!(campaign.key, "ab_campaign");
        }
    }

    #[test]
    fn zero_traffic_allocates_nobody() {
        let settings = fixture();
        let allocator = campaigns(&Murmur3Hasher);
        for i in 0..100 {
            assert!(allocator
                .allocate(&settings, None, "rollout_zero", &format!("user-{i}"))
                .is_none());
        }
    }

    #[test]
    fn grouped_campaigns_are_mutually_exclusive() {
        let settings = fixture();
        let allocator = campaigns(&Murmur3Hasher);
        let mut in_a = 0;
        let mut in_b = 0;
        for i in 0..1000 {
            let user = format!("user-{i}");
            let a = allocator.allocate(&settings, None, "group_a", &user).is_some();
            let b = allocator.allocate(&settings, None, "group_b", &user).is_some();
            assert!(a != b, "{user} must be in exactly one grouped campaign");
            in_a += usize::from(a);
            in_b += usize::from(b);
        }
        assert!(in_a > 250 && in_a < 550, "group_a got {in_a}");
        assert!(in_b > 450 && in_b < 750, "group_b got {in_b}");
    }

    #[test]
    fn grouped_allocation_matches_bucket_value() {
        let settings = fixture();
        let allocator = campaigns(&Murmur3Hasher);
        for i in 0..200 {
            let user = format!("user-{i}");
            let value = Murmur3Hasher.bucket_value(1, &user, CAMPAIGN_DOMAIN);
            let expected = if value <= 40 { "group_a" } else { "group_b" };
            assert!(allocator.allocate(&settings, None, expected, &user).is_some());
        }
    }

    #[test]
    fn sticky_campaign_skips_hashing() {
        let settings = fixture();
        let hasher = CountingHasher::default();
        let record = sticky("rollout_zero", "website");
        let campaign = campaigns(&hasher)
            .allocate(&settings, Some(&record), "rollout_zero", "u1")
            .unwrap();
        assert_eq!(campaign.key, "rollout_zero");
        assert_eq!(hasher.calls(), 0);
    }

    #[test]
    fn sticky_record_for_other_campaign_is_ignored() {
        let settings = fixture();
        let hasher = CountingHasher::default();
        let record = sticky("ab_campaign", "B");
        assert!(campaigns(&hasher)
            .allocate(&settings, Some(&record), "rollout_zero", "u1")
            .is_none());
        assert_eq!(hasher.calls(), 1);
    }

    #[test]
    fn sticky_variation_is_honored() {
        let settings = fixture();
        let campaign = settings
            .campaigns
            .iter()
            .find(|c| c.key == "ab_campaign")
            .unwrap();
        let hasher = CountingHasher::default();
        let record = sticky("ab_campaign", "Control");
        let variation = variations(&hasher)
            .allocate(Some(&record), campaign, "u1")
            .unwrap();
        assert_eq!(variation.name, "Control");
        assert_eq!(hasher.calls(), 0);
    }

    #[test]
    fn stale_sticky_variation_is_rebucketed() {
        let settings = fixture();
        let campaign = settings
            .campaigns
            .iter()
            .find(|c| c.key == "ab_campaign")
            .unwrap();
        let record = sticky("ab_campaign", "Removed");
        let variation = variations(&Murmur3Hasher)
            .allocate(Some(&record), campaign, "u1")
            .unwrap();
        assert_eq!(variation.name, "B");
    }

    #[test]
    fn variation_follows_ranges() {
        let settings = fixture();
        let campaign = settings
            .campaigns
            .iter()
            .find(|c| c.key == "ab_unordered")
            .unwrap();
        let allocator = variations(&Murmur3Hasher);
        for i in 0..200 {
            let user = format!("user-{i}");
            let value = Murmur3Hasher.bucket_value(2, &user, VARIATION_DOMAIN);
            let expected = match value {
                1..=5000 => "Control",
                5001..=7500 => "B",
                _ => "C",
            };
            assert_eq!(
                allocator.allocate(None, campaign, &user).unwrap().name,
                expected
            );
        }
    }

    proptest! {
        #[test]
        fn allocation_is_deterministic(user_id in "\\PC{1,40}") {
            let settings = fixture();
            let campaign = settings.campaigns.iter().find(|c| c.key == "ab_unordered").unwrap();
            let first = variations(&Murmur3Hasher).allocate(None, campaign, &user_id).map(|v| v.id);
            let second = variations(&Murmur3Hasher).allocate(None, campaign, &user_id).map(|v| v.id);
            prop_assert_eq!(first, second);
            prop_assert!(first.is_some());
        }
    }
}
