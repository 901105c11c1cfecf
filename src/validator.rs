//! Argument checks run before any decision is made.

/// Pre-condition gate for the public operations. A decision is only made when the matching
/// method returns `true`.
///
/// Override it to apply stricter rules (e.g. user id formats) than the default.
pub trait Validator {
    fn activate(&self, campaign_key: &str, user_id: &str) -> bool;

    fn get_variation(&self, campaign_key: &str, user_id: &str) -> bool;

    fn track(&self, campaign_key: &str, user_id: &str, goal_identifier: &str) -> bool;

    fn is_feature_enabled(&self, campaign_key: &str, user_id: &str) -> bool;

    fn get_feature_variable_value(
        &self,
        campaign_key: &str,
        variable_key: &str,
        user_id: &str,
    ) -> bool;

    fn push(&self, tag_key: &str, tag_value: &str, user_id: &str) -> bool;
}

/// Requires every argument to be non-empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

fn present(args: &[&str]) -> bool {
    args.iter().all(|arg| !arg.trim().is_empty())
}

impl Validator for DefaultValidator {
    fn activate(&self, campaign_key: &str, user_id: &str) -> bool {
        present(&[campaign_key, user_id])
    }

    fn get_variation(&self, campaign_key: &str, user_id: &str) -> bool {
        present(&[campaign_key, user_id])
    }

    fn track(&self, campaign_key: &str, user_id: &str, goal_identifier: &str) -> bool {
        present(&[campaign_key, user_id, goal_identifier])
    }

    fn is_feature_enabled(&self, campaign_key: &str, user_id: &str) -> bool {
        present(&[campaign_key, user_id])
    }

    fn get_feature_variable_value(
        &self,
        campaign_key: &str,
        variable_key: &str,
        user_id: &str,
    ) -> bool {
        present(&[campaign_key, variable_key, user_id])
    }

    fn push(&self, tag_key: &str, tag_value: &str, user_id: &str) -> bool {
        present(&[tag_key, tag_value, user_id])
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultValidator, Validator};

    #[test]
    fn requires_non_empty_arguments() {
        let v = DefaultValidator;
        assert!(v.activate("campaign", "u1"));
        assert!(!v.activate("", "u1"));
        assert!(!v.get_variation("campaign", "  "));
        assert!(v.track("campaign", "u1", "goal"));
        assert!(!v.track("campaign", "u1", ""));
        assert!(!v.is_feature_enabled("", ""));
        assert!(v.get_feature_variable_value("campaign", "color", "u1"));
        assert!(!v.get_feature_variable_value("campaign", "", "u1"));
        assert!(v.push("plan", "pro", "u1"));
        assert!(!v.push("plan", "", "u1"));
    }
}
