use std::fmt;

use crate::api::{CurrentPool, InstanceMode, InstancePools, PoolOffer, SwitchRequest};

/// Where a switch moves the instance to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchTarget {
    SpotPool { pool_id: String },
    OnDemand,
}

impl SwitchTarget {
    pub fn spot(pool_id: impl Into<String>) -> Self {
        SwitchTarget::SpotPool {
            pool_id: pool_id.into(),
        }
    }

    pub fn request(&self) -> SwitchRequest {
        match self {
            SwitchTarget::SpotPool { pool_id } => SwitchRequest {
                target_mode: InstanceMode::Spot,
                target_pool_id: Some(pool_id.clone()),
            },
            SwitchTarget::OnDemand => SwitchRequest {
                target_mode: InstanceMode::Ondemand,
                target_pool_id: None,
            },
        }
    }
}

impl fmt::Display for SwitchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchTarget::SpotPool { pool_id } => write!(f, "spot pool {pool_id}"),
            SwitchTarget::OnDemand => f.write_str("On-Demand"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanOption {
    pub offer: PoolOffer,
    pub best: bool,
    /// Percent cheaper than the current spot price; negative when pricier.
    pub savings_vs_current: Option<f64>,
}

impl PlanOption {
    pub fn target(&self) -> SwitchTarget {
        SwitchTarget::spot(self.offer.pool_id.clone())
    }
}

/// Switch options for one instance, in backend order.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchPlan {
    pub instance_id: String,
    pub current: CurrentPool,
    pub options: Vec<PlanOption>,
    pub on_demand_price: f64,
}

impl SwitchPlan {
    pub fn new(instance_id: &str, pools: InstancePools) -> Self {
        let current_price = pools.current.spot_price;
        let options = pools
            .alternate_pools
            .into_iter()
            .enumerate()
            .map(|(index, offer)| PlanOption {
                savings_vs_current: percent_below(current_price, offer.spot_price),
                best: index == 0,
                offer,
            })
            .collect();

        Self {
            instance_id: instance_id.to_string(),
            current: pools.current,
            options,
            on_demand_price: pools.ondemand.price,
        }
    }

    pub fn best(&self) -> Option<&PlanOption> {
        self.options.first()
    }

    pub fn option(&self, pool_id: &str) -> Option<&PlanOption> {
        self.options
            .iter()
            .find(|option| option.offer.pool_id == pool_id)
    }

    /// Whether the plan offers this destination.
    pub fn offers(&self, target: &SwitchTarget) -> bool {
        match target {
            SwitchTarget::SpotPool { pool_id } => self.option(pool_id).is_some(),
            SwitchTarget::OnDemand => true,
        }
    }

    /// Extra cost of on-demand over the current spot price, in percent.
    pub fn on_demand_premium(&self) -> Option<f64> {
        percent_below(self.current.spot_price, self.on_demand_price).map(|pct| -pct)
    }
}

fn percent_below(reference: f64, price: f64) -> Option<f64> {
    (reference > 0.0).then(|| (reference - price) / reference * 100.0)
}
