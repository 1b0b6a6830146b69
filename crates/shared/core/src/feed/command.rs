use serde::{Deserialize, Serialize};

use crate::entities::MintId;

/// Outbound subscription command
///
/// Serializes to `{"method":"subscribeNewToken"}` and
/// `{"method":"subscribeTokenTrade","keys":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum SubscribeCommand {
    /// Stream of token-creation events
    SubscribeNewToken,
    /// Trade stream for specific mints
    SubscribeTokenTrade { keys: Vec<String> },
}

impl SubscribeCommand {
    pub fn new_tokens() -> Self {
        SubscribeCommand::SubscribeNewToken
    }

    pub fn token_trades<'a>(mints: impl IntoIterator<Item = &'a MintId>) -> Self {
        SubscribeCommand::SubscribeTokenTrade {
            keys: mints.into_iter().map(|m| m.as_str().to_string()).collect(),
        }
    }

    /// Mints this command subscribes to (empty for the creation stream)
    pub fn keys(&self) -> &[String] {
        match self {
            SubscribeCommand::SubscribeNewToken => &[],
            SubscribeCommand::SubscribeTokenTrade { keys } => keys,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_new_token_serialization() {
        let json: Value = serde_json::from_str(&SubscribeCommand::new_tokens().to_json().unwrap())
            .unwrap();
        assert_eq!(json, json!({"method": "subscribeNewToken"}));
    }

    #[test]
    fn test_token_trade_serialization() {
        let mint = MintId::new("ABC");
        let cmd = SubscribeCommand::token_trades([&mint]);
        let json: Value = serde_json::from_str(&cmd.to_json().unwrap()).unwrap();
        assert_eq!(json, json!({"method": "subscribeTokenTrade", "keys": ["ABC"]}));
        assert_eq!(cmd.keys(), ["ABC".to_string()]);
    }

    #[test]
    fn test_command_decodes_from_wire() {
        let cmd: SubscribeCommand =
            serde_json::from_str(r#"{"method":"subscribeTokenTrade","keys":["X","Y"]}"#).unwrap();
        assert_eq!(
            cmd,
            SubscribeCommand::SubscribeTokenTrade {
                keys: vec!["X".into(), "Y".into()]
            }
        );
    }
}
