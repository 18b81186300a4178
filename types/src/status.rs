use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The kind of condition tracked on a CR's status.
///
/// A CR carries exactly one `Synced` condition at all times and at most one
/// `Terminal` condition. `Recoverable` is available to per-kind resource
/// managers that want to surface a non-terminal, non-sync-blocking warning
/// (e.g. "running with a deprecated field") without inventing a new schema.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, JsonSchema)]
pub enum ConditionType {
    Synced,
    Terminal,
    Recoverable,
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionType::Synced => write!(f, "ACK.Synced"),
            ConditionType::Terminal => write!(f, "ACK.Terminal"),
            ConditionType::Recoverable => write!(f, "ACK.Recoverable"),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// One entry of a CR's `status.conditions` list.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl Condition {
    pub fn new(
        condition_type: ConditionType,
        status: ConditionStatus,
        reason: Option<String>,
        message: Option<String>,
    ) -> Self {
        Condition {
            condition_type,
            status,
            reason,
            message,
        }
    }
}

/// `status.ackResourceMetadata`: identifies the cloud resource that this CR
/// owns, once it has been created or adopted.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct AckResourceMetadata {
    #[serde(rename = "ownerAccountID")]
    pub owner_account_id: Option<String>,
    pub region: Option<String>,
    pub arn: Option<String>,
}

/// Capability every per-kind `Status` struct must provide so the engine can
/// manipulate conditions and ACK metadata without knowing the concrete type.
pub trait ResourceStatus {
    fn conditions(&self) -> &[Condition];
    fn conditions_mut(&mut self) -> &mut Vec<Condition>;
    fn ack_resource_metadata(&self) -> Option<&AckResourceMetadata>;
    fn set_ack_resource_metadata(&mut self, meta: AckResourceMetadata);

    /// Strips the full conditions list. Conditions describe only the
    /// current reconcile's observations, so every `Sync` begins by
    /// discarding whatever the previous reconcile wrote.
    fn reset_conditions(&mut self) {
        self.conditions_mut().clear();
    }

    /// Replaces any existing condition of the same type and appends the new
    /// one, preserving the "exactly one of a kind" invariant.
    fn set_condition(&mut self, condition: Condition) {
        let conditions = self.conditions_mut();
        conditions.retain(|c| c.condition_type != condition.condition_type);
        conditions.push(condition);
    }

    fn condition(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.conditions()
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}
