//! Operating policy for an optimization run
//!
//! [`PolicyParameters`] is built once per run and validated before the
//! directory is contacted. Values are accepted case-insensitively.

use crate::error::OptimizeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted idle-shutdown timeout in minutes
pub const MIN_IDLE_MINUTES: u32 = 10;

/// Highest accepted idle-shutdown timeout in minutes
pub const MAX_IDLE_MINUTES: u32 = 120;

/// Which clusters a run considers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
    /// Only clusters created by the requesting principal
    Mine,
}

/// Whether changes are only reported or also written back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    #[default]
    View,
    Update,
}

/// Whether display names are rebuilt to the naming convention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameToggle {
    #[default]
    On,
    Off,
}

impl FromStr for Scope {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Scope::All),
            "mine" | "user" => Ok(Scope::Mine),
            other => Err(OptimizeError::Configuration(format!(
                "'clusters' can be either 'all' or 'mine', got '{}'",
                other
            ))),
        }
    }
}

impl FromStr for ApplyMode {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "view" => Ok(ApplyMode::View),
            "update" => Ok(ApplyMode::Update),
            other => Err(OptimizeError::Configuration(format!(
                "'action' can be either 'view' or 'update', got '{}'",
                other
            ))),
        }
    }
}

impl FromStr for RenameToggle {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" | "yes" => Ok(RenameToggle::On),
            "off" | "no" => Ok(RenameToggle::Off),
            other => Err(OptimizeError::Configuration(format!(
                "'rename' can be either 'on' or 'off', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Mine => write!(f, "mine"),
        }
    }
}

impl fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyMode::View => write!(f, "view"),
            ApplyMode::Update => write!(f, "update"),
        }
    }
}

/// Validated policy for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyParameters {
    scope: Scope,
    mode: ApplyMode,
    rename: RenameToggle,
    idle_minutes: u32,
}

impl PolicyParameters {
    /// Build a policy, rejecting an idle timeout outside 10..=120 minutes
    pub fn new(
        scope: Scope,
        mode: ApplyMode,
        rename: RenameToggle,
        idle_minutes: i64,
    ) -> Result<Self, OptimizeError> {
        if !(i64::from(MIN_IDLE_MINUTES)..=i64::from(MAX_IDLE_MINUTES)).contains(&idle_minutes) {
            return Err(OptimizeError::Configuration(format!(
                "'idle_time' must be between {} and {} minutes, got {}",
                MIN_IDLE_MINUTES, MAX_IDLE_MINUTES, idle_minutes
            )));
        }

        Ok(Self {
            scope,
            mode,
            rename,
            idle_minutes: idle_minutes as u32,
        })
    }

    /// Parse and validate a policy from operator-supplied strings
    pub fn parse(
        scope: &str,
        mode: &str,
        rename: &str,
        idle_minutes: i64,
    ) -> Result<Self, OptimizeError> {
        Self::new(scope.parse()?, mode.parse()?, rename.parse()?, idle_minutes)
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    pub fn rename(&self) -> RenameToggle {
        self.rename
    }

    pub fn idle_minutes(&self) -> u32 {
        self.idle_minutes
    }
}

impl Default for PolicyParameters {
    fn default() -> Self {
        Self {
            scope: Scope::All,
            mode: ApplyMode::View,
            rename: RenameToggle::On,
            idle_minutes: MIN_IDLE_MINUTES,
        }
    }
}

/// Unvalidated policy values as supplied by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySettings {
    #[serde(default = "default_clusters")]
    pub clusters: String,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default = "default_rename")]
    pub rename: String,
    #[serde(default = "default_idle_time")]
    pub idle_time: i64,
}

fn default_clusters() -> String {
    "all".to_string()
}

fn default_action() -> String {
    "view".to_string()
}

fn default_rename() -> String {
    "on".to_string()
}

fn default_idle_time() -> i64 {
    i64::from(MIN_IDLE_MINUTES)
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            clusters: default_clusters(),
            action: default_action(),
            rename: default_rename(),
            idle_time: default_idle_time(),
        }
    }
}

impl PolicySettings {
    pub fn validate(&self) -> Result<PolicyParameters, OptimizeError> {
        PolicyParameters::parse(&self.clusters, &self.action, &self.rename, self.idle_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_validate() {
        let policy = PolicySettings::default().validate().unwrap();
        assert_eq!(policy, PolicyParameters::default());
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: PolicySettings =
            serde_json::from_str(r#"{"action": "update", "idle_time": 45}"#).unwrap();
        assert_eq!(settings.clusters, "all");
        assert_eq!(settings.action, "update");
        assert_eq!(settings.rename, "on");
        assert_eq!(settings.idle_time, 45);
    }

    #[test]
    fn test_parse_valid_policy() {
        let policy = PolicyParameters::parse("mine", "update", "off", 30).unwrap();
        assert_eq!(policy.scope(), Scope::Mine);
        assert_eq!(policy.mode(), ApplyMode::Update);
        assert_eq!(policy.rename(), RenameToggle::Off);
        assert_eq!(policy.idle_minutes(), 30);
    }

    #[test]
    fn test_parse_is_case_insensitive_with_aliases() {
        let policy = PolicyParameters::parse("USER", "View", "Yes", 10).unwrap();
        assert_eq!(policy.scope(), Scope::Mine);
        assert_eq!(policy.mode(), ApplyMode::View);
        assert_eq!(policy.rename(), RenameToggle::On);

        assert_eq!("no".parse::<RenameToggle>().unwrap(), RenameToggle::Off);
    }

    #[test]
    fn test_idle_bounds_are_inclusive() {
        assert!(PolicyParameters::parse("all", "view", "on", 10).is_ok());
        assert!(PolicyParameters::parse("all", "view", "on", 120).is_ok());
        assert!(matches!(
            PolicyParameters::parse("all", "view", "on", 9),
            Err(OptimizeError::Configuration(_))
        ));
        assert!(matches!(
            PolicyParameters::parse("all", "view", "on", 121),
            Err(OptimizeError::Configuration(_))
        ));
        assert!(PolicyParameters::parse("all", "view", "on", -5).is_err());
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(matches!(
            PolicyParameters::parse("some", "view", "on", 30),
            Err(OptimizeError::Configuration(_))
        ));
        assert!(matches!(
            PolicyParameters::parse("all", "apply", "on", 30),
            Err(OptimizeError::Configuration(_))
        ));
        assert!(matches!(
            PolicyParameters::parse("all", "view", "maybe", 30),
            Err(OptimizeError::Configuration(_))
        ));
    }

    #[test]
    fn test_default_policy() {
        let policy = PolicyParameters::default();
        assert_eq!(policy.scope(), Scope::All);
        assert_eq!(policy.mode(), ApplyMode::View);
        assert_eq!(policy.rename(), RenameToggle::On);
        assert_eq!(policy.idle_minutes(), 10);
    }
}
