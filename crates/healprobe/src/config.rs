//! Run configuration.
//!
//! ```yaml
//! scenario_count: 12
//! start_time: "2024-01-15T10:00:00Z"
//! resolver:
//!   max_attempts: 10
//!   retry_interval_ms: 500
//! scenarios:
//!   - id: 1
//!     title: Shadow upload
//!     target: shadow-input-1
//!     containers: [{ id: host-1, kind: shadow_host }]
//!     synthesize_locator: true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::clock::ClockOptions;
use crate::resolver::ResolverOptions;
use crate::result::{HealError, HealResult};
use crate::scenario::{Scenario, ScenarioRegistry};

/// Default size of the scenario id range
pub const DEFAULT_SCENARIO_COUNT: u32 = 12;

/// Configuration for a fixture run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    /// Scenario ids run from 1 to this value
    pub scenario_count: u32,
    /// Virtual start time (RFC 3339); system time when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Resolver options shared by every scenario
    pub resolver: ResolverOptions,
    /// Scenario definitions
    pub scenarios: Vec<Scenario>,
}

impl Default for HealConfig {
    fn default() -> Self {
        Self {
            scenario_count: DEFAULT_SCENARIO_COUNT,
            start_time: None,
            resolver: ResolverOptions::default(),
            scenarios: Vec::new(),
        }
    }
}

impl HealConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scenario count
    #[must_use]
    pub const fn with_scenario_count(mut self, count: u32) -> Self {
        self.scenario_count = count;
        self
    }

    /// Set resolver options
    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverOptions) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the virtual start time
    #[must_use]
    pub fn with_start_time(mut self, timestamp: impl Into<String>) -> Self {
        self.start_time = Some(timestamp.into());
        self
    }

    /// Add a scenario
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Parse YAML and validate
    ///
    /// # Errors
    ///
    /// Returns a YAML or configuration error
    pub fn from_yaml_str(yaml: &str) -> HealResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file and validate
    ///
    /// # Errors
    ///
    /// Returns an I/O, parse or configuration error
    pub fn load(path: impl AsRef<Path>) -> HealResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text)?,
            _ => serde_yaml_ng::from_str(&text)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    ///
    /// Returns a YAML error
    pub fn to_yaml(&self) -> HealResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check invariants
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first violation
    pub fn validate(&self) -> HealResult<()> {
        if self.scenario_count == 0 {
            return Err(HealError::config("scenario_count must be at least 1"));
        }
        if self.resolver.max_attempts == 0 {
            return Err(HealError::config("resolver.max_attempts must be at least 1"));
        }
        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.id) {
                return Err(HealError::config(format!("duplicate scenario id {}", scenario.id)));
            }
            if scenario.target.trim().is_empty() {
                return Err(HealError::config(format!("scenario {} has an empty target", scenario.id)));
            }
        }
        if let Some(start) = &self.start_time {
            ClockOptions::from_rfc3339(start)?;
        }
        Ok(())
    }

    /// Clock options for the configured start time
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `start_time` does not parse
    pub fn clock_options(&self) -> HealResult<ClockOptions> {
        match &self.start_time {
            Some(start) => ClockOptions::from_rfc3339(start),
            None => Ok(ClockOptions::now()),
        }
    }

    /// Scenario registry
    ///
    /// # Errors
    ///
    /// Returns a configuration error on duplicate ids
    pub fn registry(&self) -> HealResult<ScenarioRegistry> {
        ScenarioRegistry::new(self.scenarios.iter().cloned())
    }

    /// Scenario id range
    pub fn scenario_ids(&self) -> impl Iterator<Item = u32> {
        1..=self.scenario_count
    }
}
