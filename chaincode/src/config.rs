//! Chaincode configuration.

/// Main chaincode configuration.
#[derive(Debug, Clone)]
pub struct ChaincodeConfig {
    /// Chaincode name as installed on the channel.
    pub name: String,
    /// Chaincode version.
    pub version: String,
    /// Channel the chaincode is instantiated on.
    pub channel_id: String,
    /// Log level.
    pub log_level: String,
    /// Emit logs as JSON.
    pub json_logs: bool,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            name: "accounts".to_string(),
            version: "1.0".to_string(),
            channel_id: "mychannel".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ChaincodeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("CHAINCODE_NAME") {
            config.name = name;
        }

        if let Ok(version) = std::env::var("CHAINCODE_VERSION") {
            config.version = version;
        }

        if let Ok(channel) = std::env::var("CHANNEL_NAME") {
            config.channel_id = channel;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.json_logs = format.eq_ignore_ascii_case("json");
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Chaincode name cannot be empty".to_string());
        }

        if self.version.is_empty() {
            return Err("Chaincode version cannot be empty".to_string());
        }

        if self.channel_id.is_empty() {
            return Err("Channel name cannot be empty".to_string());
        }

        if !self
            .channel_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        {
            return Err(format!("Invalid channel name: {}", self.channel_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChaincodeConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ChaincodeConfig::default();
        config.channel_id = String::new();
        assert!(config.validate().is_err());

        let mut config = ChaincodeConfig::default();
        config.channel_id = "My_Channel".to_string();
        assert!(config.validate().is_err());
    }
}
