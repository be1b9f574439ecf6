//! Pomodoro cycle state machine.
//!
//! ```text
//! Work -> Break -> Work -> Break -> ... -> Work -> LongBreak -> Work ...
//! ```
//!
//! [`PomodoroCycle`] is a pure transition function. [`PomodoroRun`] holds the
//! transient run state and is advanced one second per tick by the tracker;
//! it never reads the wall clock.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

use crate::error::Result;
use crate::task::PomodoroSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Break,
    LongBreak,
}

impl Phase {
    pub fn is_work(self) -> bool {
        self == Phase::Work
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
            Phase::LongBreak => "Long break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a transition: the phase to enter and how long it lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStep {
    pub phase: Phase,
    pub duration_secs: u64,
    pub cycles_completed: u32,
}

/// Validated phase durations for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroCycle {
    work_secs: u64,
    break_secs: u64,
    long_break_secs: u64,
    cycles_before_long: NonZeroU32,
}

impl PomodoroCycle {
    /// Build a cycle from task settings.
    ///
    /// # Errors
    /// `InvalidConfiguration` if the settings fail validation.
    pub fn new(settings: &PomodoroSettings) -> Result<Self> {
        settings.validate()?;
        let cycles_before_long = NonZeroU32::new(settings.cycles_before_long).ok_or_else(|| {
            crate::error::TrackerError::InvalidConfiguration(
                "pomodoro_cycles must be at least 1".into(),
            )
        })?;
        Ok(Self {
            work_secs: u64::from(settings.work_min) * 60,
            break_secs: u64::from(settings.break_min) * 60,
            long_break_secs: u64::from(settings.long_break_min) * 60,
            cycles_before_long,
        })
    }

    pub fn cycles_before_long(&self) -> u32 {
        self.cycles_before_long.get()
    }

    /// The first phase of every tracking run.
    pub fn initial(&self) -> PhaseStep {
        PhaseStep {
            phase: Phase::Work,
            duration_secs: self.work_secs,
            cycles_completed: 0,
        }
    }

    /// Phase that follows `current` after `cycles_completed` Work phases.
    pub fn next(&self, current: Phase, cycles_completed: u32) -> PhaseStep {
        match current {
            Phase::Work => {
                let cycles = cycles_completed.saturating_add(1);
                if cycles % self.cycles_before_long.get() == 0 {
                    PhaseStep {
                        phase: Phase::LongBreak,
                        duration_secs: self.long_break_secs,
                        cycles_completed: cycles,
                    }
                } else {
                    PhaseStep {
                        phase: Phase::Break,
                        duration_secs: self.break_secs,
                        cycles_completed: cycles,
                    }
                }
            }
            Phase::Break | Phase::LongBreak => PhaseStep {
                phase: Phase::Work,
                duration_secs: self.work_secs,
                cycles_completed,
            },
        }
    }
}

/// A phase change produced by [`PomodoroRun::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: PhaseStep,
}

/// Transient run state for the task being tracked.
#[derive(Debug, Clone)]
pub struct PomodoroRun {
    cycle: PomodoroCycle,
    phase: Phase,
    cycles_completed: u32,
    remaining_secs: i64,
}

impl PomodoroRun {
    pub fn start(cycle: PomodoroCycle) -> Self {
        let step = cycle.initial();
        Self {
            cycle,
            phase: step.phase,
            cycles_completed: step.cycles_completed,
            remaining_secs: step.duration_secs as i64,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn cycles_before_long(&self) -> u32 {
        self.cycle.cycles_before_long()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs.max(0) as u64
    }

    /// Advance by one second. Returns the transition when the phase expires.
    pub fn tick(&mut self) -> Option<PhaseTransition> {
        self.remaining_secs -= 1;
        if self.remaining_secs > 0 {
            return None;
        }
        let from = self.phase;
        let to = self.cycle.next(from, self.cycles_completed);
        self.phase = to.phase;
        self.cycles_completed = to.cycles_completed;
        self.remaining_secs = to.duration_secs as i64;
        Some(PhaseTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(work: u32, brk: u32, long: u32, cycles: u32) -> PomodoroSettings {
        PomodoroSettings {
            work_min: work,
            break_min: brk,
            long_break_min: long,
            cycles_before_long: cycles,
        }
    }

    #[test]
    fn initial_phase_is_work_with_zero_cycles() {
        let cycle = PomodoroCycle::new(&settings(25, 5, 15, 4)).unwrap();
        let step = cycle.initial();
        assert_eq!(step.phase, Phase::Work);
        assert_eq!(step.duration_secs, 25 * 60);
        assert_eq!(step.cycles_completed, 0);
    }

    #[test]
    fn every_nth_work_phase_leads_to_long_break() {
        let cycle = PomodoroCycle::new(&settings(25, 5, 15, 2)).unwrap();
        let first = cycle.next(Phase::Work, 0);
        assert_eq!((first.phase, first.cycles_completed), (Phase::Break, 1));
        assert_eq!(first.duration_secs, 5 * 60);

        let back = cycle.next(first.phase, first.cycles_completed);
        assert_eq!((back.phase, back.cycles_completed), (Phase::Work, 1));

        let second = cycle.next(Phase::Work, 1);
        assert_eq!((second.phase, second.cycles_completed), (Phase::LongBreak, 2));
        assert_eq!(second.duration_secs, 15 * 60);
    }

    #[test]
    fn single_cycle_always_takes_long_breaks() {
        let cycle = PomodoroCycle::new(&settings(25, 5, 15, 1)).unwrap();
        assert_eq!(cycle.next(Phase::Work, 0).phase, Phase::LongBreak);
        assert_eq!(cycle.next(Phase::Work, 7).phase, Phase::LongBreak);
    }

    #[test]
    fn zero_cycles_rejected_before_the_machine_exists() {
        assert!(PomodoroCycle::new(&settings(25, 5, 15, 0)).is_err());
    }

    #[test]
    fn run_transitions_when_remaining_reaches_zero() {
        let cycle = PomodoroCycle::new(&settings(1, 1, 2, 2)).unwrap();
        let mut run = PomodoroRun::start(cycle);
        for _ in 0..59 {
            assert!(run.tick().is_none());
        }
        assert_eq!(run.remaining_secs(), 1);
        let t = run.tick().unwrap();
        assert_eq!(t.from, Phase::Work);
        assert_eq!(t.to.phase, Phase::Break);
        assert_eq!(run.remaining_secs(), 60);
        assert_eq!(run.cycles_completed(), 1);
    }

    #[test]
    fn zero_length_break_ends_on_next_tick() {
        let cycle = PomodoroCycle::new(&settings(1, 0, 0, 3)).unwrap();
        let mut run = PomodoroRun::start(cycle);
        for _ in 0..60 {
            run.tick();
        }
        assert_eq!(run.phase(), Phase::Break);
        let t = run.tick().unwrap();
        assert_eq!(t.to.phase, Phase::Work);
    }

    #[test]
    fn labels() {
        assert_eq!(Phase::LongBreak.to_string(), "Long break");
        assert_eq!(Phase::Work.label(), "Work");
    }
}
