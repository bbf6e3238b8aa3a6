use thiserror::Error;

use atc_model::{GateId, ModelError, PlaneId};

/// Errors raised by the controller and its resources.
///
/// Three families:
/// - interruption (`Cancelled`, `Drained`, `GrantDropped`): a wait was aborted; the caller
///   gives up its current step and unwinds, nothing is corrupted;
/// - consistency (`Inconsistent`): arbitration state is broken, the simulation must stop;
/// - misuse (everything else): a caller broke the resource protocol, also fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AtcError {
    #[error("wait cancelled")]
    Cancelled,

    #[error("controller already drained")]
    Drained,

    #[error("grant for {0} was never delivered")]
    GrantDropped(PlaneId),

    #[error("inconsistent state: {0}")]
    Inconsistent(String),

    #[error("{plane} released {gate} which it does not hold")]
    GateNotHeld { plane: PlaneId, gate: GateId },

    #[error("{gate} is outside the pool of {capacity} gates")]
    GateOutOfRange { gate: GateId, capacity: usize },

    #[error("{plane} released the {resource} which it does not hold")]
    ResourceNotHeld {
        plane: PlaneId,
        resource: &'static str,
    },

    #[error("{plane} already holds the {resource}")]
    AlreadyHeld {
        plane: PlaneId,
        resource: &'static str,
    },

    #[error("completion reported more than {expected} times")]
    CompletionOverflow { expected: usize },

    #[error("dispatch loop already running")]
    AlreadyRunning,

    #[error("invalid config: {0}")]
    Config(String),
}

impl AtcError {
    /// Returns `true` for aborted waits which callers recover from locally.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            AtcError::Cancelled | AtcError::Drained | AtcError::GrantDropped(_)
        )
    }

    /// Returns `true` when the simulation must stop with a diagnostic.
    pub fn is_fatal(&self) -> bool {
        !self.is_interruption()
    }
}

impl From<ModelError> for AtcError {
    fn from(e: ModelError) -> Self {
        AtcError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interruptions_are_not_fatal() {
        assert!(!AtcError::Cancelled.is_fatal());
        assert!(!AtcError::Drained.is_fatal());
        assert!(!AtcError::GrantDropped(PlaneId(1)).is_fatal());
    }

    #[test]
    fn violations_are_fatal() {
        let gate = GateId::from_index(0);
        assert!(AtcError::Inconsistent("x".into()).is_fatal());
        assert!(AtcError::GateNotHeld { plane: PlaneId(1), gate }.is_fatal());
        assert!(AtcError::CompletionOverflow { expected: 2 }.is_fatal());
    }

    #[test]
    fn messages_name_the_parties() {
        let e = AtcError::GateNotHeld {
            plane: PlaneId(4),
            gate: GateId::from_index(1),
        };
        assert_eq!(e.to_string(), "Plane-4 released Gate-2 which it does not hold");
    }

    #[test]
    fn model_errors_become_config_errors() {
        let e: AtcError = ModelError::InvalidConfig("gates must be at least 1".into()).into();
        assert!(matches!(e, AtcError::Config(msg) if msg.contains("gates")));
    }
}
