use serde::Serialize;

use crate::config::PlanConfig;

/// A purchasable credit bundle
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub description: String,
    /// Minor currency units
    pub price: i64,
    pub credits: i32,
}

impl From<&PlanConfig> for Plan {
    fn from(config: &PlanConfig) -> Self {
        Self {
            id: config.id.clone(),
            description: config.description.clone(),
            price: config.price,
            credits: config.credits,
        }
    }
}

/// Static plan table, loaded once from validated configuration
#[derive(Debug, Clone)]
pub struct PlanTable {
    plans: Vec<Plan>,
}

impl PlanTable {
    pub fn from_config(plans: &[PlanConfig]) -> Self {
        Self {
            plans: plans.iter().map(Plan::from).collect(),
        }
    }

    pub fn get(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }

    pub fn all(&self) -> &[Plan] {
        &self.plans
    }
}

/// GET /api/plans
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlansResponse {
    pub success: bool,
    pub currency: String,
    pub plans: Vec<Plan>,
}
