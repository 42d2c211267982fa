//! JSON scripts for driving a channel lifecycle manager.

use alloy::primitives::{Address, B256, I256, U256};
use serde::{Deserialize, Serialize};
use settle_channel::{ChannelState, PendingChallenge, SignedChannelState};

/// A channel and the operations to apply to it in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelScript {
    pub channel_id: B256,
    pub participants: [Address; 2],
    pub deposit: U256,
    pub split_percent: u8,
    /// Script clock start (Unix seconds). Defaults to the system time.
    #[serde(default)]
    pub start_time: Option<u64>,
    /// Record failed steps and keep going instead of stopping.
    #[serde(default)]
    pub continue_on_error: bool,
    pub ops: Vec<ChannelOp>,
}

/// One scripted operation.
///
/// Tagged by a snake_case `op`; variant fields are camelCase like the rest
/// of the script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChannelOp {
    ConfirmOpen,
    Trade { delta: [I256; 2] },
    Resize { new_total: U256 },
    Close { allocations: [U256; 2] },
    Challenge { candidate: SignedChannelState },
    FinalizeChallenge,
    /// Move the script clock forward.
    Advance { secs: u64 },
}

impl ChannelOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfirmOpen => "confirm_open",
            Self::Trade { .. } => "trade",
            Self::Resize { .. } => "resize",
            Self::Close { .. } => "close",
            Self::Challenge { .. } => "challenge",
            Self::FinalizeChallenge => "finalize_challenge",
            Self::Advance { .. } => "advance",
        }
    }
}

/// Outcome of one scripted step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub index: usize,
    pub op: String,
    pub now: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub nonce: u64,
    pub status: String,
}

/// Result of running a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRunReport {
    pub steps: Vec<StepOutcome>,
    pub final_state: ChannelState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_challenge: Option<PendingChallenge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script: ChannelScript = serde_json::from_str(
            r#"{
                "channelId": "0x4242424242424242424242424242424242424242424242424242424242424242",
                "participants": [
                    "0x1111111111111111111111111111111111111111",
                    "0x2222222222222222222222222222222222222222"
                ],
                "deposit": "100",
                "splitPercent": 50,
                "startTime": 1700000000,
                "ops": [
                    { "op": "confirm_open" },
                    { "op": "trade", "delta": ["-10", "10"] },
                    { "op": "advance", "secs": 60 },
                    { "op": "resize", "newTotal": "200" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.deposit, U256::from(100));
        assert_eq!(script.ops.len(), 4);
        assert!(!script.continue_on_error);
        match &script.ops[1] {
            ChannelOp::Trade { delta } => {
                assert_eq!(delta[0], I256::try_from(-10).unwrap());
            }
            other => panic!("unexpected op {other:?}"),
        }
        assert_eq!(script.ops[3].name(), "resize");
    }

    #[test]
    fn test_op_fields_are_camel_case() {
        let op = ChannelOp::Resize {
            new_total: U256::from(200),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "resize");
        assert!(json.get("newTotal").is_some());
        assert!(json.get("new_total").is_none());

        let snake = serde_json::from_str::<ChannelOp>(r#"{ "op": "resize", "new_total": "200" }"#);
        assert!(snake.is_err());
    }
}
