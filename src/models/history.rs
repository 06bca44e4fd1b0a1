use crate::api::{ExecutionStatus, SwitchEvent, SwitchTrigger};

/// Client-side narrowing of an already fetched switch history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub trigger: Option<SwitchTrigger>,
    pub status: Option<ExecutionStatus>,
}

impl HistoryFilter {
    pub fn matches(&self, event: &SwitchEvent) -> bool {
        self.trigger.map_or(true, |t| event.event_trigger == t)
            && self.status.map_or(true, |s| event.execution_status == s)
    }

    pub fn apply<'a>(&self, events: &'a [SwitchEvent]) -> Vec<&'a SwitchEvent> {
        events.iter().filter(|event| self.matches(event)).collect()
    }

    pub fn savings_impact(&self, events: &[SwitchEvent]) -> f64 {
        self.apply(events).iter().map(|event| event.savings_impact).sum()
    }
}
