use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Static airport layout and population the controller is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AirportConfig {
    /// Number of interchangeable gates (pool capacity).
    pub gates: usize,
    /// Number of planes that must complete before the controller drains.
    pub expected_planes: usize,
}

impl Default for AirportConfig {
    fn default() -> Self {
        Self {
            gates: 3,
            expected_planes: 6,
        }
    }
}

impl AirportConfig {
    /// Convenience constructor.
    pub fn new(gates: usize, expected_planes: usize) -> Self {
        Self {
            gates,
            expected_planes,
        }
    }

    /// Reject layouts under which no landing could ever be granted.
    pub fn validate(&self) -> ModelResult<()> {
        if self.gates == 0 {
            return Err(ModelError::InvalidConfig(
                "gates must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_demo_airport() {
        let cfg = AirportConfig::default();
        assert_eq!(cfg.gates, 3);
        assert_eq!(cfg.expected_planes, 6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_gates_is_invalid() {
        let err = AirportConfig::new(0, 2).validate().unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
    }

    #[test]
    fn zero_planes_is_allowed() {
        assert!(AirportConfig::new(1, 0).validate().is_ok());
    }

    #[test]
    fn partial_deserialization_uses_defaults() {
        let cfg: AirportConfig = serde_json::from_str(r#"{"gates": 1}"#).unwrap();
        assert_eq!(cfg.gates, 1);
        assert_eq!(cfg.expected_planes, 6);

        let cfg: AirportConfig = serde_json::from_str(r#"{"expectedPlanes": 10}"#).unwrap();
        assert_eq!(cfg.gates, 3);
        assert_eq!(cfg.expected_planes, 10);
    }
}
