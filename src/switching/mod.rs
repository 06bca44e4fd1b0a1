mod plan;
mod session;

pub use plan::{PlanOption, SwitchPlan, SwitchTarget};
pub use session::{
    SwitchGateway, SwitchOutcome, SwitchPhase, SwitchPrompt, SwitchSession, SwitchState,
};
