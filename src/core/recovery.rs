//! Recovery planning: maps a failure site to an ordered set of actions
//!
//! The planner is pure; the controller keeps an append-only history of the
//! plans it produced. Every plan ends with `Cancel`.

use super::trace::FailureTrace;

/// Closed set of recovery actions offered to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Retry,
    Replay,
    Cancel,
    Skip,
}

impl RecoveryAction {
    /// Action name (part of the public string contract)
    pub fn name(&self) -> &'static str {
        match self {
            RecoveryAction::Retry => "Retry",
            RecoveryAction::Replay => "Replay",
            RecoveryAction::Cancel => "Cancel",
            RecoveryAction::Skip => "Skip",
        }
    }
}

/// One step in a recovery plan
#[derive(Debug, Clone)]
pub struct RecoveryStep {
    pub action: RecoveryAction,
    pub description: String,
}

/// Ordered plan of actions for a recorded failure
#[derive(Debug, Clone, Default)]
pub struct RecoveryPlan {
    pub correlation_id: u64,
    pub failure_module: String,
    pub failure_stage: String,
    pub failure_message: String,
    pub steps: Vec<RecoveryStep>,
}

impl RecoveryPlan {
    pub fn has_action(&self, action: RecoveryAction) -> bool {
        self.steps.iter().any(|s| s.action == action)
    }

    /// Human-readable block shown on user-visible failure
    pub fn format(&self) -> String {
        let mut out = String::from("Recovery Plan");
        if self.correlation_id != 0 {
            out.push_str(&format!(" (cid:{})", self.correlation_id));
        }
        out.push('\n');
        out.push_str(&format!(
            "  failure: {}/{} - {}\n",
            self.failure_module, self.failure_stage, self.failure_message
        ));
        out.push_str("  actions:\n");
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!(
                "    {}. [{}] {}\n",
                i + 1,
                step.action.name(),
                step.description
            ));
        }
        out
    }
}

/// Produces recovery plans and remembers what it handed out
#[derive(Default)]
pub struct RecoveryController {
    history: Vec<RecoveryPlan>,
}

impl RecoveryController {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
        }
    }

    /// Plan for a failure at the given module/stage
    pub fn plan_from_stage(&mut self, module: &str, stage: &str, error: &str) -> RecoveryPlan {
        let plan = RecoveryPlan {
            correlation_id: 0,
            failure_module: module.to_string(),
            failure_stage: stage.to_string(),
            failure_message: error.to_string(),
            steps: generate_steps(module, stage),
        };
        self.history.push(plan.clone());
        plan
    }

    /// Plan from a captured trace; copies correlation id, module, and stage
    pub fn plan_from_trace(&mut self, trace: &FailureTrace) -> RecoveryPlan {
        let plan = RecoveryPlan {
            correlation_id: trace.correlation_id,
            failure_module: trace.module.clone(),
            failure_stage: trace.stage.clone(),
            failure_message: trace.error_message.clone(),
            steps: generate_steps(&trace.module, &trace.stage),
        };
        self.history.push(plan.clone());
        plan
    }

    pub fn history(&self) -> &[RecoveryPlan] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history_size(&self) -> usize {
        self.history.len()
    }
}

fn generate_steps(module: &str, stage: &str) -> Vec<RecoveryStep> {
    let mut steps = Vec::new();

    if module == "network" || stage == "fetch" || stage == "connect" {
        steps.push(RecoveryStep {
            action: RecoveryAction::Retry,
            description: "Retry the network request".to_string(),
        });
        steps.push(RecoveryStep {
            action: RecoveryAction::Skip,
            description: "Skip this resource and continue".to_string(),
        });
    } else if module == "html" || module == "css" || stage == "parse" {
        steps.push(RecoveryStep {
            action: RecoveryAction::Replay,
            description: format!("Replay {} parsing with current input", module),
        });
    } else if module == "renderer" || stage == "layout" || stage == "render" || stage == "paint" {
        steps.push(RecoveryStep {
            action: RecoveryAction::Replay,
            description: "Replay render with current layout".to_string(),
        });
    } else {
        steps.push(RecoveryStep {
            action: RecoveryAction::Retry,
            description: "Retry the failed operation".to_string(),
        });
    }

    // Cancel is always the last resort
    steps.push(RecoveryStep {
        action: RecoveryAction::Cancel,
        description: "Cancel and return to idle state".to_string(),
    });

    steps
}
