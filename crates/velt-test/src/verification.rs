//! Verification helpers for testing flow rule population
//!
//! Provides assertion helpers over the objectives and calls recorded by
//! [`RecordingHost`]

use thiserror::Error;
use velt_common::{ApplicationId, DeviceId, ForwardingObjective, PortNumber};

use crate::recording::{HostCall, RecordingHost};

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("No objective on {device} matching in_port={in_port} vlan={vlan}")]
    RuleNotFound {
        device: String,
        in_port: u64,
        vlan: u16,
    },

    #[error("Rule in_port={in_port} vlan={vlan}: expected {field} '{expected}', got '{actual}'")]
    RuleMismatch {
        in_port: u64,
        vlan: u16,
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Expected {expected} submitted objectives, found {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Expected call '{call}' was never made")]
    CallMissing { call: &'static str },

    #[error("Call '{first}' was expected before '{second}'")]
    OutOfOrder {
        first: &'static str,
        second: &'static str,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Expected shape of one submitted rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedRule {
    /// Ingress port
    pub in_port: u64,
    /// VLAN matched on ingress
    pub vlan: u16,
    /// VLAN written before output, if any
    pub rewrite: Option<u16>,
    /// Egress port
    pub out_port: u64,
}

impl ExpectedRule {
    /// Rule that forwards without touching the tag
    pub fn forward(in_port: u64, vlan: u16, out_port: u64) -> Self {
        Self {
            in_port,
            vlan,
            rewrite: None,
            out_port,
        }
    }

    /// Rule that retags before forwarding
    pub fn retag(in_port: u64, vlan: u16, rewrite: u16, out_port: u64) -> Self {
        Self {
            in_port,
            vlan,
            rewrite: Some(rewrite),
            out_port,
        }
    }

    fn matches(&self, objective: &ForwardingObjective) -> bool {
        objective.selector.in_port == PortNumber::new(self.in_port)
            && objective.selector.vlan_id.value() == self.vlan
    }
}

/// Flow objective verification helper
pub struct FlowVerifier<'a> {
    host: &'a RecordingHost,
}

impl<'a> FlowVerifier<'a> {
    /// Create a new verifier over a recording host
    pub fn new(host: &'a RecordingHost) -> Self {
        Self { host }
    }

    /// Verify the total number of submitted objectives
    pub fn assert_forward_count(&self, expected: usize) -> VerifyResult<()> {
        let actual = self.host.forwarded().len();
        if actual != expected {
            return Err(VerificationError::CountMismatch { expected, actual });
        }
        Ok(())
    }

    /// Verify that an objective with the expected match and actions was
    /// submitted to `device`
    pub fn assert_rule(&self, device: &str, expected: ExpectedRule) -> VerifyResult<()> {
        let device_id = DeviceId::new(device);
        let objective = self
            .host
            .forwarded()
            .into_iter()
            .filter(|(dev, _)| *dev == device_id)
            .map(|(_, obj)| obj)
            .find(|obj| expected.matches(obj))
            .ok_or_else(|| VerificationError::RuleNotFound {
                device: device.to_string(),
                in_port: expected.in_port,
                vlan: expected.vlan,
            })?;

        let mismatch = |field: &'static str, expected_value: String, actual: String| {
            VerificationError::RuleMismatch {
                in_port: expected.in_port,
                vlan: expected.vlan,
                field,
                expected: expected_value,
                actual,
            }
        };

        let rewrite = objective.treatment.set_vlan_id.map(|v| v.value());
        if rewrite != expected.rewrite {
            return Err(mismatch(
                "rewrite",
                format!("{:?}", expected.rewrite),
                format!("{:?}", rewrite),
            ));
        }
        if objective.treatment.output != PortNumber::new(expected.out_port) {
            return Err(mismatch(
                "output",
                expected.out_port.to_string(),
                objective.treatment.output.to_string(),
            ));
        }
        Ok(())
    }

    /// Verify all rules at once
    pub fn assert_rules(&self, device: &str, expected: &[ExpectedRule]) -> VerifyResult<()> {
        for rule in expected {
            self.assert_rule(device, *rule)?;
        }
        Ok(())
    }

    /// Verify that every submitted objective is owned by `app_id`, permanent
    /// and carries `priority`
    pub fn assert_all_owned(&self, app_id: &ApplicationId, priority: i32) -> VerifyResult<()> {
        for (_, obj) in self.host.forwarded() {
            let vlan = obj.selector.vlan_id.value();
            let in_port = obj.selector.in_port.value();
            if obj.app_id != *app_id {
                return Err(VerificationError::RuleMismatch {
                    in_port,
                    vlan,
                    field: "app_id",
                    expected: app_id.to_string(),
                    actual: obj.app_id.to_string(),
                });
            }
            if !obj.permanent {
                return Err(VerificationError::RuleMismatch {
                    in_port,
                    vlan,
                    field: "permanent",
                    expected: "true".to_string(),
                    actual: "false".to_string(),
                });
            }
            if obj.priority != priority {
                return Err(VerificationError::RuleMismatch {
                    in_port,
                    vlan,
                    field: "priority",
                    expected: priority.to_string(),
                    actual: obj.priority.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Verify the teardown sequence: rules withdrawn, then listener removed,
    /// then schema unregistered
    pub fn assert_teardown_order(&self) -> VerifyResult<()> {
        let withdraw = self.position("remove_flow_rules_by_id", |c| {
            matches!(c, HostCall::RemoveFlowRulesById(_))
        })?;
        let unsubscribe =
            self.position("remove_listener", |c| matches!(c, HostCall::RemoveListener(_)))?;
        let unregister = self.position("unregister_config_factory", |c| {
            matches!(c, HostCall::UnregisterConfigFactory(_))
        })?;

        if withdraw > unsubscribe {
            return Err(VerificationError::OutOfOrder {
                first: "remove_flow_rules_by_id",
                second: "remove_listener",
            });
        }
        if unsubscribe > unregister {
            return Err(VerificationError::OutOfOrder {
                first: "remove_listener",
                second: "unregister_config_factory",
            });
        }
        Ok(())
    }

    fn position(
        &self,
        call: &'static str,
        pred: impl Fn(&HostCall) -> bool,
    ) -> VerifyResult<usize> {
        self.host
            .position(pred)
            .ok_or(VerificationError::CallMissing { call })
    }
}

/// The four rules [`crate::fixtures::standard_config`] should produce
pub fn standard_rules() -> [ExpectedRule; 4] {
    use crate::fixtures::*;
    [
        ExpectedRule::forward(STANDARD_UPLINK, STANDARD_SITE_VLAN, STANDARD_VM1),
        ExpectedRule::retag(
            STANDARD_VM2,
            STANDARD_SITE_VLAN,
            STANDARD_TEMP_VLAN,
            STANDARD_UPLINK,
        ),
        ExpectedRule::forward(STANDARD_UPLINK, STANDARD_TEMP_VLAN, STANDARD_VM2),
        ExpectedRule::retag(
            STANDARD_VM1,
            STANDARD_TEMP_VLAN,
            STANDARD_SITE_VLAN,
            STANDARD_UPLINK,
        ),
    ]
}
