//! Configuration for the optimization pipeline.
//!
//! [`OptimizerConfig`] selects which passes the
//! [`PassScheduler`](crate::compiler::PassScheduler) runs and how synthesized names
//! are spelled.

use crate::analysis::{cfg::DEFAULT_ENTRY_PREFIX, ssa::DEFAULT_UNDEFINED_NAME};

/// Default name prefix for synthesized loop preheaders.
pub const DEFAULT_PREHEADER_PREFIX: &str = "preheader";

/// Configuration for the optimization pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Run SSA construction (default: false).
    pub enable_ssa: bool,

    /// Run loop-invariant code motion (default: true).
    pub enable_licm: bool,

    /// Make fallthrough explicit before any graph pass (default: true).
    ///
    /// Graph passes only see edges named by `jmp`/`br`; leaving this off is only
    /// sound for functions that never fall through.
    pub add_terminators: bool,

    /// Process the functions of a program in parallel (default: false).
    pub parallel: bool,

    /// Name read by SSA uses without a reaching definition.
    pub undefined_name: String,

    /// Prefix for synthesized entry blocks.
    pub entry_prefix: String,

    /// Prefix for synthesized preheader blocks.
    pub preheader_prefix: String,

    /// How many times LICM runs per function (default: 1).
    pub max_licm_rounds: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enable_ssa: false,
            enable_licm: true,
            add_terminators: true,
            parallel: false,
            undefined_name: DEFAULT_UNDEFINED_NAME.to_string(),
            entry_prefix: DEFAULT_ENTRY_PREFIX.to_string(),
            preheader_prefix: DEFAULT_PREHEADER_PREFIX.to_string(),
            max_licm_rounds: 1,
        }
    }
}

impl OptimizerConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with every pass disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enable_ssa: false,
            enable_licm: false,
            ..Self::default()
        }
    }

    /// Returns true if any pass is enabled.
    #[must_use]
    pub fn any_enabled(&self) -> bool {
        self.enable_ssa || self.enable_licm
    }

    /// Enables or disables SSA construction.
    #[must_use]
    pub fn with_ssa(mut self, enabled: bool) -> Self {
        self.enable_ssa = enabled;
        self
    }

    /// Enables or disables loop-invariant code motion.
    #[must_use]
    pub fn with_licm(mut self, enabled: bool) -> Self {
        self.enable_licm = enabled;
        self
    }

    /// Enables or disables explicit fallthrough terminators.
    #[must_use]
    pub fn with_terminators(mut self, enabled: bool) -> Self {
        self.add_terminators = enabled;
        self
    }

    /// Enables or disables parallel processing of functions.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the SSA undefined-value name.
    #[must_use]
    pub fn with_undefined_name(mut self, name: impl Into<String>) -> Self {
        self.undefined_name = name.into();
        self
    }

    /// Sets the entry block prefix.
    #[must_use]
    pub fn with_entry_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entry_prefix = prefix.into();
        self
    }

    /// Sets the preheader prefix.
    #[must_use]
    pub fn with_preheader_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.preheader_prefix = prefix.into();
        self
    }

    /// Sets how many LICM rounds run per function.
    #[must_use]
    pub fn with_licm_rounds(mut self, rounds: usize) -> Self {
        self.max_licm_rounds = rounds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OptimizerConfig::default();
        assert!(!config.enable_ssa);
        assert!(config.enable_licm);
        assert!(config.add_terminators);
        assert!(!config.parallel);
        assert_eq!(config.undefined_name, "__undefined");
        assert_eq!(config.entry_prefix, "entry");
        assert_eq!(config.preheader_prefix, "preheader");
        assert_eq!(config.max_licm_rounds, 1);
    }

    #[test]
    fn test_disabled() {
        let config = OptimizerConfig::disabled();
        assert!(!config.any_enabled());
        assert!(config.add_terminators);
        assert!(OptimizerConfig::new().with_ssa(true).any_enabled());
    }
}
