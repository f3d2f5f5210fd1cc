//! Push receiver configuration

use crate::errors::ConfigError;
use crate::pdu::CodecOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `MMS_PUSH__RECEIVER__DISPATCH_BUDGET_MS`
pub const ENV_PREFIX: &str = "MMS_PUSH";

/// Complete push receiver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Decoder switches
    pub codec: CodecOptions,
    /// Preference defaults
    pub mms: MmsConfig,
    /// Task execution
    pub receiver: ReceiverConfig,
}

/// Defaults used when a preference has never been written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MmsConfig {
    /// Default of `pref_key_enable_wap_push`
    pub wap_push_default: bool,
    /// Default of `pref_key_mms_group_mms`
    pub group_mms_default: bool,
    /// Default of `pref_key_mms_transaction_id`
    pub transaction_id_default: bool,
}

/// Receiver task configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Time budget for dispatch + execution of one push (ms)
    pub dispatch_budget_ms: u64,
    /// Log push payloads as hex at trace level
    pub trace_payloads: bool,
}

impl Default for MmsConfig {
    fn default() -> Self {
        Self {
            wap_push_default: true,
            group_mms_default: true,
            transaction_id_default: false,
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            dispatch_budget_ms: 5000,
            trace_payloads: false,
        }
    }
}

impl ReceiverConfig {
    pub fn dispatch_budget(&self) -> Duration {
        Duration::from_millis(self.dispatch_budget_ms)
    }
}

impl PushConfig {
    /// Defaults, then an optional file, then `MMS_PUSH__*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a JSON file that must exist
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::from(path).format(config::FileFormat::Json))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.receiver.dispatch_budget_ms == 0 {
            return Err(ConfigError::Invalid(
                "receiver.dispatch_budget_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
