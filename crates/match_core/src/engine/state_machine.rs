//! Per-trial match state machine
//!
//! `InProgress` at tick 0 with a 0-0 score, one event applied per tick, and
//! `Terminal` once the clock reaches the match length. `Terminal` absorbs:
//! any further event is an invariant violation that fails the trial.

use serde::{Deserialize, Serialize};

use crate::config::{CardRules, TimelineDetail};
use crate::error::TrialFailure;
use crate::models::{
    CardSeverity, CardTally, MatchEvent, MatchResult, Side, TerminalReason, TimedEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InProgress,
    Terminal,
}

/// Card effect on one side, active while `tick < expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveModifier {
    pub side: Side,
    pub severity: CardSeverity,
    pub penalty: f64,
    pub expires_at: u32,
}

/// Mutable record of one trial. Read-only to the rating model.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    tick: u32,
    match_length: u32,
    score: [u16; 2],
    cards: [CardTally; 2],
    modifiers: Vec<ActiveModifier>,
    max_penalty: f64,
    phase: Phase,
}

impl MatchState {
    pub fn new(match_length: u32) -> Self {
        Self {
            tick: 0,
            match_length,
            score: [0, 0],
            cards: [CardTally::default(); 2],
            modifiers: Vec::new(),
            max_penalty: CardRules::default().max_penalty,
            phase: Phase::InProgress,
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn match_length(&self) -> u32 {
        self.match_length
    }

    pub fn score(&self, side: Side) -> u16 {
        self.score[side.index()]
    }

    pub fn cards(&self, side: Side) -> CardTally {
        self.cards[side.index()]
    }

    pub fn modifiers(&self) -> &[ActiveModifier] {
        &self.modifiers
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Terminal
    }

    /// Summed penalty of the side's active modifiers, capped.
    pub fn penalty(&self, side: Side) -> f64 {
        let total: f64 = self
            .modifiers
            .iter()
            .filter(|m| m.side == side)
            .map(|m| m.penalty)
            .sum();
        total.min(self.max_penalty)
    }
}

pub struct MatchStateMachine {
    state: MatchState,
    rules: CardRules,
    detail: TimelineDetail,
    timeline: Vec<TimedEvent>,
    renormalized_ticks: u32,
}

impl MatchStateMachine {
    pub fn new(match_length: u32, rules: CardRules) -> Self {
        let state = MatchState { max_penalty: rules.max_penalty, ..MatchState::new(match_length) };
        Self {
            state,
            rules,
            detail: TimelineDetail::Full,
            timeline: Vec::new(),
            renormalized_ticks: 0,
        }
    }

    pub fn with_timeline(mut self, detail: TimelineDetail) -> Self {
        self.detail = detail;
        if detail == TimelineDetail::Full {
            self.timeline.reserve(self.state.match_length as usize);
        }
        self
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn timeline(&self) -> &[TimedEvent] {
        &self.timeline
    }

    /// Tick the next event must carry.
    pub fn next_tick(&self) -> u32 {
        self.state.tick + 1
    }

    pub(crate) fn note_renormalized(&mut self) {
        self.renormalized_ticks += 1;
    }

    /// Apply one event and advance the clock.
    pub fn apply(&mut self, timed: TimedEvent) -> Result<Phase, TrialFailure> {
        if self.state.is_terminal() {
            return Err(TrialFailure::EventAfterTerminal { tick: timed.tick });
        }
        if timed.tick != self.next_tick() {
            return Err(TrialFailure::TickOutOfOrder { current: self.state.tick, got: timed.tick });
        }
        let tick = timed.tick;

        match timed.event {
            MatchEvent::Goal { side } => {
                let slot = &mut self.state.score[side.index()];
                *slot = slot.checked_add(1).ok_or(TrialFailure::ScoreOverflow { tick })?;
            }
            MatchEvent::Card { side, severity } => {
                let tally = &mut self.state.cards[side.index()];
                let (penalty, expires_at) = match severity {
                    CardSeverity::Caution => {
                        tally.cautions = tally.cautions.saturating_add(1);
                        (
                            self.rules.caution_penalty,
                            tick.saturating_add(self.rules.caution_duration),
                        )
                    }
                    CardSeverity::Dismissal => {
                        tally.dismissals = tally.dismissals.saturating_add(1);
                        (self.rules.dismissal_penalty, self.state.match_length)
                    }
                };
                self.state.modifiers.push(ActiveModifier { side, severity, penalty, expires_at });
            }
            MatchEvent::NoEvent => {}
        }

        self.state.tick = tick;
        self.state.modifiers.retain(|m| m.expires_at > tick);

        if self.detail == TimelineDetail::Full || timed.event.is_significant() {
            self.timeline.push(timed);
        }

        if tick >= self.state.match_length {
            self.state.phase = Phase::Terminal;
        }
        Ok(self.state.phase)
    }

    /// Snapshot the trial. Stops the clock if the trial ends early.
    pub fn finish(mut self, run_index: u64, seed: u64, reason: TerminalReason) -> MatchResult {
        self.state.phase = Phase::Terminal;
        MatchResult {
            run_index,
            seed,
            score_a: self.state.score(Side::A),
            score_b: self.state.score(Side::B),
            match_length: self.state.match_length,
            ticks_played: self.state.tick,
            timeline: self.timeline,
            terminal_reason: reason,
            cards_a: self.state.cards(Side::A),
            cards_b: self.state.cards(Side::B),
            renormalized_ticks: self.renormalized_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(length: u32) -> MatchStateMachine {
        MatchStateMachine::new(length, CardRules::default())
    }

    fn goal(side: Side) -> MatchEvent {
        MatchEvent::Goal { side }
    }

    fn card(side: Side, severity: CardSeverity) -> MatchEvent {
        MatchEvent::Card { side, severity }
    }

    #[test]
    fn test_initial_state() {
        let m = machine(90);
        let s = m.state();
        assert_eq!(s.tick(), 0);
        assert_eq!(s.score(Side::A), 0);
        assert_eq!(s.score(Side::B), 0);
        assert!(s.modifiers().is_empty());
        assert_eq!(s.phase(), Phase::InProgress);
    }

    #[test]
    fn test_goal_increments_scoring_side() {
        let mut m = machine(90);
        m.apply(TimedEvent::new(1, goal(Side::B))).unwrap();
        m.apply(TimedEvent::new(2, goal(Side::B))).unwrap();
        m.apply(TimedEvent::new(3, goal(Side::A))).unwrap();
        assert_eq!(m.state().score(Side::A), 1);
        assert_eq!(m.state().score(Side::B), 2);
    }

    #[test]
    fn test_no_event_only_moves_clock() {
        let mut m = machine(90);
        let before = m.state().clone();
        m.apply(TimedEvent::new(1, MatchEvent::NoEvent)).unwrap();
        assert_eq!(m.state().tick(), 1);
        assert_eq!(m.state().score(Side::A), before.score(Side::A));
        assert_eq!(m.state().modifiers(), before.modifiers());
    }

    #[test]
    fn test_caution_expires() {
        let rules = CardRules { caution_duration: 3, ..CardRules::default() };
        let mut m = MatchStateMachine::new(90, rules.clone());
        m.apply(TimedEvent::new(1, card(Side::A, CardSeverity::Caution))).unwrap();
        assert_eq!(m.state().penalty(Side::A), rules.caution_penalty);
        assert_eq!(m.state().modifiers()[0].expires_at, 4);

        m.apply(TimedEvent::new(2, MatchEvent::NoEvent)).unwrap();
        m.apply(TimedEvent::new(3, MatchEvent::NoEvent)).unwrap();
        assert_eq!(m.state().modifiers().len(), 1);
        m.apply(TimedEvent::new(4, MatchEvent::NoEvent)).unwrap();
        assert!(m.state().modifiers().is_empty());
        assert_eq!(m.state().penalty(Side::A), 0.0);
        assert_eq!(m.state().cards(Side::A).cautions, 1);
    }

    #[test]
    fn test_dismissal_lasts_until_end() {
        let mut m = machine(20);
        m.apply(TimedEvent::new(1, card(Side::B, CardSeverity::Dismissal))).unwrap();
        for tick in 2..20 {
            m.apply(TimedEvent::new(tick, MatchEvent::NoEvent)).unwrap();
            assert!(m.state().penalty(Side::B) > 0.0, "tick {tick}");
        }
        assert_eq!(m.state().penalty(Side::A), 0.0);
    }

    #[test]
    fn test_penalty_capped() {
        let rules = CardRules { max_penalty: 0.2, ..CardRules::default() };
        let mut m = MatchStateMachine::new(90, rules);
        for tick in 1..=5 {
            m.apply(TimedEvent::new(tick, card(Side::A, CardSeverity::Dismissal))).unwrap();
        }
        assert_eq!(m.state().penalty(Side::A), 0.2);
        assert_eq!(m.state().cards(Side::A).dismissals, 5);
    }

    #[test]
    fn test_terminal_at_match_length_and_absorbing() {
        let mut m = machine(3);
        assert_eq!(m.apply(TimedEvent::new(1, MatchEvent::NoEvent)).unwrap(), Phase::InProgress);
        assert_eq!(m.apply(TimedEvent::new(2, MatchEvent::NoEvent)).unwrap(), Phase::InProgress);
        assert_eq!(m.apply(TimedEvent::new(3, goal(Side::A))).unwrap(), Phase::Terminal);

        let err = m.apply(TimedEvent::new(4, goal(Side::A))).unwrap_err();
        assert_eq!(err, TrialFailure::EventAfterTerminal { tick: 4 });
        assert_eq!(m.state().score(Side::A), 1);
        assert_eq!(m.state().tick(), 3);
    }

    #[test]
    fn test_out_of_order_tick_rejected() {
        let mut m = machine(10);
        m.apply(TimedEvent::new(1, MatchEvent::NoEvent)).unwrap();
        let err = m.apply(TimedEvent::new(1, MatchEvent::NoEvent)).unwrap_err();
        assert_eq!(err, TrialFailure::TickOutOfOrder { current: 1, got: 1 });
        let err = m.apply(TimedEvent::new(5, MatchEvent::NoEvent)).unwrap_err();
        assert_eq!(err, TrialFailure::TickOutOfOrder { current: 1, got: 5 });
    }

    #[test]
    fn test_score_overflow_is_failure() {
        let mut m = machine(10);
        m.state.score[0] = u16::MAX;
        let err = m.apply(TimedEvent::new(1, goal(Side::A))).unwrap_err();
        assert_eq!(err, TrialFailure::ScoreOverflow { tick: 1 });
    }

    #[test]
    fn test_significant_timeline_skips_quiet_ticks() {
        let mut m = machine(5).with_timeline(TimelineDetail::Significant);
        m.apply(TimedEvent::new(1, MatchEvent::NoEvent)).unwrap();
        m.apply(TimedEvent::new(2, goal(Side::A))).unwrap();
        m.apply(TimedEvent::new(3, MatchEvent::NoEvent)).unwrap();
        assert_eq!(m.timeline(), &[TimedEvent::new(2, goal(Side::A))]);
    }

    #[test]
    fn test_finish_snapshot() {
        let mut m = machine(2);
        m.apply(TimedEvent::new(1, card(Side::A, CardSeverity::Caution))).unwrap();
        m.note_renormalized();
        m.apply(TimedEvent::new(2, goal(Side::B))).unwrap();
        let result = m.finish(5, 42, TerminalReason::Completed);
        assert_eq!(result.run_index, 5);
        assert_eq!(result.seed, 42);
        assert_eq!((result.score_a, result.score_b), (0, 1));
        assert_eq!(result.ticks_played, 2);
        assert_eq!(result.timeline.len(), 2);
        assert_eq!(result.cards_a.cautions, 1);
        assert_eq!(result.renormalized_ticks, 1);
    }

    #[test]
    fn test_timeline_ticks_strictly_increase() {
        let mut m = machine(30);
        for tick in 1..=30 {
            let event = if tick % 7 == 0 { goal(Side::A) } else { MatchEvent::NoEvent };
            m.apply(TimedEvent::new(tick, event)).unwrap();
        }
        let ticks: Vec<u32> = m.timeline().iter().map(|e| e.tick).collect();
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
        assert!(ticks.iter().all(|&t| t >= 1 && t <= 30));
    }
}
