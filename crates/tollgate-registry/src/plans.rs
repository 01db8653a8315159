use std::collections::HashMap;

use indexmap::IndexMap;
use tollgate_config::PlanConfig;

/// Static plan catalogue and the `subscription_config_id -> plan id` map
#[derive(Debug, Clone, Default)]
pub struct PlanTable {
    plans: IndexMap<String, PlanConfig>,
    by_subscription_config: HashMap<String, String>,
}

impl PlanTable {
    pub fn new(plans: IndexMap<String, PlanConfig>) -> Self {
        let by_subscription_config = plans
            .iter()
            .filter_map(|(plan_id, plan)| {
                plan.subscription_config_id()
                    .map(|config_id| (config_id.to_owned(), plan_id.clone()))
            })
            .collect();

        Self {
            plans,
            by_subscription_config,
        }
    }

    pub fn get(&self, plan_id: &str) -> Option<&PlanConfig> {
        self.plans.get(plan_id)
    }

    pub fn contains(&self, plan_id: &str) -> bool {
        self.plans.contains_key(plan_id)
    }

    /// Plan backed by a subscription config, if any
    pub fn plan_for_subscription_config(&self, subscription_config_id: &str) -> Option<&str> {
        self.by_subscription_config
            .get(subscription_config_id.trim())
            .map(String::as_str)
    }

    /// First configured plan, used when a fallback candidate has no mapped plan
    pub fn default_plan(&self) -> Option<&str> {
        self.plans.keys().next().map(String::as_str)
    }

    /// Plans in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlanConfig)> {
        self.plans.iter().map(|(id, plan)| (id.as_str(), plan))
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
