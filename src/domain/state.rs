use crate::domain::errors::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Lifecycle of a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Complete,
    Cancelled,
    Error,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Complete | RunState::Cancelled | RunState::Error)
    }

    /// `idle -> running -> {complete | cancelled | error}`; a finished run may
    /// start again or be reset to idle.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Idle, Running) => true,
            (Running, Complete | Cancelled | Error) => true,
            (Complete | Cancelled | Error, Running | Idle) => true,
            (Idle, Idle) => true,
            _ => false,
        }
    }

    pub fn transition(&mut self, next: RunState) -> BenchResult<()> {
        if !self.can_transition_to(next) {
            return Err(match (*self, next) {
                (RunState::Running, RunState::Running) => BenchError::AlreadyRunning,
                (from, to) => BenchError::InvalidConfig(format!("illegal state change {} -> {}", from, to)),
            });
        }
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_lifecycle_is_one_directional() {
        let mut state = RunState::default();
        state.transition(RunState::Running).unwrap();
        assert_eq!(state.transition(RunState::Running), Err(BenchError::AlreadyRunning));
        assert!(state.transition(RunState::Idle).is_err());
        state.transition(RunState::Complete).unwrap();
        assert!(state.transition(RunState::Cancelled).is_err());
        state.transition(RunState::Running).unwrap();
        assert_eq!(state.to_string(), "running");
    }
}
