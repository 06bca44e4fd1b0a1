use crate::api::GlobalStats;

/// Derived figures for the home view.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalOverview {
    pub manual_today: u64,
    pub model_today: u64,
    /// Inferred: the backend does not report scheduled switches.
    pub scheduled_24h: u64,
    pub total_24h: u64,
    pub monthly_projection: f64,
}

impl GlobalOverview {
    pub fn from_stats(stats: &GlobalStats) -> Self {
        let switches = &stats.switches;
        let scheduled_24h = switches
            .total_24h
            .saturating_sub(switches.manual_today)
            .saturating_sub(switches.model_today);

        Self {
            manual_today: switches.manual_today,
            model_today: switches.model_today,
            scheduled_24h,
            total_24h: switches.total_24h,
            monthly_projection: stats
                .monthly_projection
                .unwrap_or_else(|| project_month(stats)),
        }
    }
}

fn project_month(stats: &GlobalStats) -> f64 {
    if stats.daily_savings.is_empty() {
        return 0.0;
    }
    let total: f64 = stats.daily_savings.iter().map(|day| day.savings).sum();
    total / stats.daily_savings.len() as f64 * 30.0
}
