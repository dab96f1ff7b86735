use crate::error::{DecodeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when the input breaks a rule real-world tables are known to
/// break.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tolerance {
    /// Abort the current chunk with the error.
    Reject,
    /// Log the error and continue with a best-effort result.
    #[default]
    Warn,
    /// Continue silently.
    Ignore,
}

impl Tolerance {
    /// Applies the policy to a lazily built error.
    pub fn check<F: FnOnce() -> DecodeError>(self, err: F) -> Result<()> {
        match self {
            Self::Reject => Err(err()),
            Self::Warn => {
                tracing::warn!("{}", err());
                Ok(())
            }
            Self::Ignore => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DecodeOptions {
    /// A string pool declares more offsets than fit before its data.
    pub truncated_offsets: Tolerance,
    /// A string pool declares a style offset but no styles.
    pub lying_styles: Tolerance,
    /// A config descriptor is larger than the fields we understand.
    pub oversized_config: Tolerance,
    /// Two values for the same resource in the same config.
    pub duplicate_resources: Tolerance,
    /// Library, overlayable and staged alias chunks inside a package.
    pub unknown_chunks: Tolerance,
}

impl DecodeOptions {
    /// Every heuristic turned into a hard error.
    pub fn strict() -> Self {
        Self {
            truncated_offsets: Tolerance::Reject,
            lying_styles: Tolerance::Reject,
            oversized_config: Tolerance::Reject,
            duplicate_resources: Tolerance::Reject,
            unknown_chunks: Tolerance::Reject,
        }
    }

    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Default::default());
        }
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }
}
