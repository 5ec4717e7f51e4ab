//! Evaluation configuration
//!
//! Thresholds and knobs consulted by the evaluator when it picks a kernel.
//! Values come from [`EvalConfig::default`], the `with_*` builders, or the
//! process environment through [`EvalConfig::from_env`]:
//!
//! | variable | field |
//! |----------|-------|
//! | `STRATA_BLOCK_SIZE` | `block_size` |
//! | `STRATA_EXTERNAL_THRESHOLD` | `external_threshold` |
//! | `STRATA_PARALLEL_THRESHOLD` | `parallel_threshold` |
//! | `STRATA_PARALLEL` | `parallel` (`1`/`true`/`on` or `0`/`false`/`off`) |
//! | `STRATA_KERNEL` | `kernel` (`auto`, `naive`, `blocked`, `parallel`, `external`) |

use crate::error::{StrataError, StrataResult};
use std::str::FromStr;

/// Default tile edge for the blocked product kernel
pub const DEFAULT_BLOCK_SIZE: usize = 64;

/// Default `m * n * k` from which a registered external kernel is used
pub const DEFAULT_EXTERNAL_THRESHOLD: usize = 64 * 64 * 64;

/// Default `m * n * k` from which the parallel product kernel is used
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 128 * 128 * 128;

/// Product kernel forced by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KernelPreference {
    /// Choose from shapes and thresholds
    #[default]
    Auto,
    /// Always the naive triple loop
    Naive,
    /// Always the blocked kernel
    Blocked,
    /// Parallel kernel when the target allows it
    Parallel,
    /// External kernel when one is registered
    External,
}

impl FromStr for KernelPreference {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(KernelPreference::Auto),
            "naive" => Ok(KernelPreference::Naive),
            "blocked" => Ok(KernelPreference::Blocked),
            "parallel" => Ok(KernelPreference::Parallel),
            "external" => Ok(KernelPreference::External),
            other => Err(StrataError::InvalidConfig(format!(
                "unknown kernel preference '{}'",
                other
            ))),
        }
    }
}

/// Knobs controlling kernel selection
///
/// # Examples
///
/// ```
/// use strata_core::{EvalConfig, KernelPreference};
///
/// let config = EvalConfig::new()
///     .with_block_size(32)
///     .with_kernel(KernelPreference::Blocked);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.block_size, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalConfig {
    /// Tile edge of the blocked product kernel
    pub block_size: usize,
    /// `m * n * k` from which a registered external kernel takes over
    pub external_threshold: usize,
    /// `m * n * k` from which the parallel kernel is used
    pub parallel_threshold: usize,
    /// Allow data-parallel product kernels
    pub parallel: bool,
    /// Forced product kernel
    pub kernel: KernelPreference,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            external_threshold: DEFAULT_EXTERNAL_THRESHOLD,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            parallel: cfg!(feature = "parallel"),
            kernel: KernelPreference::Auto,
        }
    }
}

impl EvalConfig {
    /// Configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blocked-kernel tile edge
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the external-kernel threshold
    pub fn with_external_threshold(mut self, threshold: usize) -> Self {
        self.external_threshold = threshold;
        self
    }

    /// Set the parallel-kernel threshold
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Enable or disable parallel kernels
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Force a product kernel
    pub fn with_kernel(mut self, kernel: KernelPreference) -> Self {
        self.kernel = kernel;
        self
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    ///
    /// [`StrataError::InvalidConfig`] when `block_size` is zero.
    pub fn validate(&self) -> StrataResult<()> {
        if self.block_size == 0 {
            return Err(StrataError::InvalidConfig(
                "block_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults overridden by `STRATA_*` environment variables
    ///
    /// # Errors
    ///
    /// [`StrataError::InvalidConfig`] when a variable is set but cannot be
    /// parsed, or when the result fails [`validate`](Self::validate).
    pub fn from_env() -> StrataResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StrataResult<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup("STRATA_BLOCK_SIZE") {
            config.block_size = parse_usize("STRATA_BLOCK_SIZE", &v)?;
        }
        if let Some(v) = lookup("STRATA_EXTERNAL_THRESHOLD") {
            config.external_threshold = parse_usize("STRATA_EXTERNAL_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("STRATA_PARALLEL_THRESHOLD") {
            config.parallel_threshold = parse_usize("STRATA_PARALLEL_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("STRATA_PARALLEL") {
            config.parallel = parse_bool("STRATA_PARALLEL", &v)?;
        }
        if let Some(v) = lookup("STRATA_KERNEL") {
            config.kernel = v.parse()?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_usize(key: &str, value: &str) -> StrataResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| StrataError::InvalidConfig(format!("{}: '{}' is not a count", key, value)))
}

fn parse_bool(key: &str, value: &str) -> StrataResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(StrataError::InvalidConfig(format!(
            "{}: '{}' is not a boolean",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_validate() {
        let config = EvalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.kernel, KernelPreference::Auto);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let config = EvalConfig::new().with_block_size(0);
        assert!(matches!(
            config.validate(),
            Err(StrataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_lookup_overrides() {
        let config = EvalConfig::from_lookup(lookup(&[
            ("STRATA_BLOCK_SIZE", "16"),
            ("STRATA_PARALLEL", "off"),
            ("STRATA_KERNEL", "Blocked"),
        ]))
        .unwrap();
        assert_eq!(config.block_size, 16);
        assert!(!config.parallel);
        assert_eq!(config.kernel, KernelPreference::Blocked);
        assert_eq!(config.external_threshold, DEFAULT_EXTERNAL_THRESHOLD);
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        assert!(EvalConfig::from_lookup(lookup(&[("STRATA_BLOCK_SIZE", "big")])).is_err());
        assert!(EvalConfig::from_lookup(lookup(&[("STRATA_PARALLEL", "maybe")])).is_err());
        assert!(EvalConfig::from_lookup(lookup(&[("STRATA_BLOCK_SIZE", "0")])).is_err());
    }
}
