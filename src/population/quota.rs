//! Population quota modes

use serde::{Deserialize, Serialize};

/// How the agent head count relates to the human head count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaMode {
    /// Exactly `count` agents
    #[default]
    Fixed,
    /// Top the teams up to `count` participants
    Fill,
    /// `count` agents per human
    Match,
}

/// Process-wide population target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationTarget {
    pub mode: QuotaMode,
    pub count: usize,
    /// Keep one slot free so a joining human never finds the server full
    pub auto_vacate: bool,
    /// No agents until a human is playing
    pub wait_for_human: bool,
}

impl PopulationTarget {
    pub fn fixed(count: usize) -> Self {
        Self {
            mode: QuotaMode::Fixed,
            count,
            ..Self::default()
        }
    }

    /// Agents wanted right now
    ///
    /// `humans_playing` counts humans on playing teams; `humans_connected`
    /// also counts human spectators, who still hold a slot.
    pub fn desired_count(
        &self,
        humans_playing: usize,
        humans_connected: usize,
        capacity: usize,
    ) -> usize {
        if self.wait_for_human && humans_playing == 0 {
            return 0;
        }

        let desired = match self.mode {
            QuotaMode::Fixed => self.count,
            QuotaMode::Fill => self.count.saturating_sub(humans_playing),
            QuotaMode::Match => self.count.saturating_mul(humans_playing),
        };

        let reserved = usize::from(self.auto_vacate);
        let room = capacity
            .saturating_sub(humans_connected)
            .saturating_sub(reserved);
        desired.min(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(mode: QuotaMode, count: usize) -> PopulationTarget {
        PopulationTarget {
            mode,
            count,
            ..PopulationTarget::default()
        }
    }

    #[test]
    fn test_modes() {
        assert_eq!(target(QuotaMode::Fixed, 6).desired_count(2, 2, 24), 6);
        assert_eq!(target(QuotaMode::Fill, 6).desired_count(2, 2, 24), 4);
        assert_eq!(target(QuotaMode::Fill, 6).desired_count(9, 9, 24), 0);
        assert_eq!(target(QuotaMode::Match, 2).desired_count(3, 3, 24), 6);
    }

    #[test]
    fn test_capacity_clamp_and_vacate() {
        let mut fixed = target(QuotaMode::Fixed, 30);
        assert_eq!(fixed.desired_count(2, 3, 24), 21);
        fixed.auto_vacate = true;
        assert_eq!(fixed.desired_count(2, 3, 24), 20);
        assert_eq!(fixed.desired_count(30, 30, 24), 0);
    }

    #[test]
    fn test_wait_for_human() {
        let mut fixed = PopulationTarget::fixed(4);
        fixed.wait_for_human = true;
        assert_eq!(fixed.desired_count(0, 0, 24), 0);
        // a spectating human does not count as present
        assert_eq!(fixed.desired_count(0, 1, 24), 0);
        assert_eq!(fixed.desired_count(1, 1, 24), 4);
    }
}
