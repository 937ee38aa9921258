//! Mission state machine
//!
//! Missions change only on scenario events. A change normally restarts the
//! agent's higher-level behavior; the host polls for that with
//! [`MissionState::take_behavior_reset`].

use serde::{Deserialize, Serialize};

/// High-level job an agent is carrying out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mission {
    #[default]
    None,
    SeekAndDestroy,
    DestroyFortifications,
    Sniper,
    Infiltrator,
    Builder,
    Reprogrammed,
}

impl Mission {
    /// Missions that keep the agent out of squads
    pub fn is_solo(&self) -> bool {
        matches!(self, Mission::Sniper | Mission::Infiltrator | Mission::Builder)
    }
}

/// Current mission plus the pending behavior-reset flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionState {
    current: Mission,
    reset_pending: bool,
}

impl MissionState {
    pub fn new(mission: Mission) -> Self {
        Self {
            current: mission,
            reset_pending: false,
        }
    }

    pub fn current(&self) -> Mission {
        self.current
    }

    pub fn is(&self, mission: Mission) -> bool {
        self.current == mission
    }

    /// Switch missions; returns the previous one
    ///
    /// Setting the mission already in effect is a no-op.
    pub fn set(&mut self, mission: Mission, suppress_reset: bool) -> Mission {
        let previous = self.current;
        if previous == mission {
            return previous;
        }
        self.current = mission;
        if !suppress_reset {
            self.reset_pending = true;
        }
        previous
    }

    pub fn is_reset_pending(&self) -> bool {
        self.reset_pending
    }

    /// Consume the pending behavior reset
    pub fn take_behavior_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_pending)
    }
}
