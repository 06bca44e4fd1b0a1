use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, InstancePools, SwitchRequest};
use crate::refresh::RefreshTarget;
use crate::types::ConsoleError;

use super::plan::{SwitchPlan, SwitchTarget};

/// Backend calls the switch workflow needs.
#[async_trait]
pub trait SwitchGateway: Send + Sync + 'static {
    async fn instance_pools(&self, instance_id: &str) -> Result<InstancePools, ConsoleError>;

    async fn switch_instance(
        &self,
        instance_id: &str,
        request: &SwitchRequest,
    ) -> Result<(), ConsoleError>;
}

#[async_trait]
impl SwitchGateway for ApiClient {
    async fn instance_pools(&self, instance_id: &str) -> Result<InstancePools, ConsoleError> {
        ApiClient::instance_pools(self, instance_id).await
    }

    async fn switch_instance(
        &self,
        instance_id: &str,
        request: &SwitchRequest,
    ) -> Result<(), ConsoleError> {
        ApiClient::switch_instance(self, instance_id, request).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwitchPhase {
    #[default]
    Idle,
    OpeningPlan,
    PlanReady,
    ConfirmingSwitch,
    Switching,
}

#[derive(Debug, Clone, Default)]
pub struct SwitchState {
    pub phase: SwitchPhase,
    pub instance_id: Option<String>,
    pub plan: Option<SwitchPlan>,
    pub pending: Option<SwitchTarget>,
    pub error: Option<String>,
    generation: u64,
}

impl SwitchState {
    /// Switch actions are offered only while the plan is idle on screen.
    pub fn actions_enabled(&self) -> bool {
        self.phase == SwitchPhase::PlanReady
    }

    fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }
}

/// Confirmation the operator must accept before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPrompt {
    pub instance_id: String,
    pub target: SwitchTarget,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched {
        instance_id: String,
        target: SwitchTarget,
    },
    Aborted,
}

/// Management session for one instance at a time.
///
/// `Idle -> OpeningPlan -> PlanReady -> ConfirmingSwitch -> Switching`, then
/// back to `Idle` on success or to `PlanReady` (plan kept, error set) on
/// failure.
pub struct SwitchSession<G: SwitchGateway> {
    gateway: Arc<G>,
    state: watch::Sender<SwitchState>,
}

impl<G: SwitchGateway> SwitchSession<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        let (state, _) = watch::channel(SwitchState::default());
        Self { gateway, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SwitchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SwitchState {
        self.state.borrow().clone()
    }

    /// Loads the plan for `instance_id`. On failure the session stays closed.
    pub async fn open(&self, instance_id: &str) -> Result<(), ConsoleError> {
        let mut generation = None;
        self.state.send_if_modified(|state| {
            if state.phase != SwitchPhase::Idle {
                return false;
            }
            state.reset();
            state.phase = SwitchPhase::OpeningPlan;
            state.instance_id = Some(instance_id.to_string());
            generation = Some(state.generation);
            true
        });
        let Some(generation) = generation else {
            return Err(busy(self.snapshot().phase));
        };

        debug!(instance_id, "Loading switch plan");
        let result = self.gateway.instance_pools(instance_id).await;

        let mut outcome = Err(ConsoleError::InvalidState(format!(
            "switch session for {instance_id} closed while loading"
        )));
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            match result {
                Ok(pools) => {
                    state.plan = Some(SwitchPlan::new(instance_id, pools));
                    state.phase = SwitchPhase::PlanReady;
                    outcome = Ok(());
                }
                Err(err) => {
                    warn!(instance_id, error = %err, "Failed to load switch plan");
                    state.reset();
                    state.error = Some(err.to_string());
                    outcome = Err(err);
                }
            }
            true
        });
        outcome
    }

    /// Asks to switch to `target`; nothing is sent until [`confirm`](Self::confirm).
    pub fn request_switch(&self, target: SwitchTarget) -> Result<SwitchPrompt, ConsoleError> {
        let mut prompt = None;
        self.state.send_if_modified(|state| {
            let (SwitchPhase::PlanReady, Some(instance_id), Some(plan)) =
                (state.phase, &state.instance_id, &state.plan)
            else {
                return false;
            };
            if !plan.offers(&target) {
                prompt = Some(Err(ConsoleError::Validation(format!(
                    "{target} is not offered for instance {instance_id}"
                ))));
                return false;
            }
            prompt = Some(Ok(SwitchPrompt {
                instance_id: instance_id.clone(),
                message: format!(
                    "Switch instance {instance_id} to {target}? This changes its cost and availability."
                ),
                target: target.clone(),
            }));
            state.pending = Some(target);
            state.phase = SwitchPhase::ConfirmingSwitch;
            true
        });
        prompt.unwrap_or_else(|| Err(busy(self.snapshot().phase)))
    }

    /// Operator declined the prompt; back to the plan without a request.
    pub fn decline(&self) -> SwitchOutcome {
        self.state.send_if_modified(|state| {
            if state.phase != SwitchPhase::ConfirmingSwitch {
                return false;
            }
            state.pending = None;
            state.phase = SwitchPhase::PlanReady;
            true
        });
        SwitchOutcome::Aborted
    }

    /// Sends the confirmed switch. Success closes the session and refreshes
    /// `owner`; failure returns to the plan with the error shown.
    pub async fn confirm(&self, owner: &dyn RefreshTarget) -> Result<SwitchOutcome, ConsoleError> {
        let mut claimed = None;
        self.state.send_if_modified(|state| {
            if state.phase != SwitchPhase::ConfirmingSwitch {
                return false;
            }
            let (Some(instance_id), Some(target)) = (state.instance_id.clone(), state.pending.take())
            else {
                return false;
            };
            state.phase = SwitchPhase::Switching;
            state.error = None;
            claimed = Some((instance_id, target, state.generation));
            true
        });
        let Some((instance_id, target, generation)) = claimed else {
            return Err(busy(self.snapshot().phase));
        };

        let request = target.request();
        let result = self.gateway.switch_instance(&instance_id, &request).await;

        match result {
            Ok(()) => {
                info!(instance_id = %instance_id, target = %target, "Instance switch requested");
                self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.reset();
                    true
                });
                owner.request_refresh().await;
                Ok(SwitchOutcome::Switched { instance_id, target })
            }
            Err(err) => {
                warn!(instance_id = %instance_id, target = %target, error = %err, "Instance switch failed");
                self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.phase = SwitchPhase::PlanReady;
                    state.error = Some(err.to_string());
                    true
                });
                Err(err)
            }
        }
    }

    /// Closes the session. Refused while a switch is in flight.
    pub fn close(&self) -> Result<(), ConsoleError> {
        let mut refused = None;
        self.state.send_if_modified(|state| {
            if state.phase == SwitchPhase::Switching {
                refused = Some(busy(state.phase));
                return false;
            }
            state.reset();
            true
        });
        refused.map_or(Ok(()), Err)
    }
}

fn busy(phase: SwitchPhase) -> ConsoleError {
    ConsoleError::InvalidState(format!("switch session is {phase:?}"))
}
