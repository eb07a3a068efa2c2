//! Terminal match state.

use tracing::{debug, info};
use waypoint_defence_core::{Event, MatchOutcome};

/// Single authority deciding when and how the match ends.
///
/// Once an outcome is recorded every further report is ignored.
#[derive(Clone, Debug)]
pub struct OutcomeTracker {
    max_enemies_allowed: u32,
    goal_reach_count: u32,
    outcome: Option<MatchOutcome>,
}

impl OutcomeTracker {
    /// Creates a tracker that declares defeat after `max_enemies_allowed` goal arrivals.
    #[must_use]
    pub const fn new(max_enemies_allowed: u32) -> Self {
        Self {
            max_enemies_allowed,
            goal_reach_count: 0,
            outcome: None,
        }
    }

    /// Records an enemy reaching the goal.
    pub fn report_goal_reached(&mut self, out_events: &mut Vec<Event>) {
        if self.is_over() {
            debug!(target: "td.outcome", "goal report after match end ignored");
            return;
        }

        self.goal_reach_count = self.goal_reach_count.saturating_add(1);
        out_events.push(Event::GoalReached {
            count: self.goal_reach_count,
            max_allowed: self.max_enemies_allowed,
        });

        if self.goal_reach_count >= self.max_enemies_allowed {
            self.finish(MatchOutcome::Defeat, out_events);
        }
    }

    /// Records that the campaign was cleared.
    pub fn report_victory(&mut self, out_events: &mut Vec<Event>) {
        if self.is_over() {
            debug!(target: "td.outcome", "victory report after match end ignored");
            return;
        }

        self.finish(MatchOutcome::Victory, out_events);
    }

    /// Reports whether the match reached a terminal state.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Terminal outcome, if the match ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Number of enemies that reached the goal.
    #[must_use]
    pub const fn goal_reach_count(&self) -> u32 {
        self.goal_reach_count
    }

    /// Goal arrivals that end the match.
    #[must_use]
    pub const fn max_enemies_allowed(&self) -> u32 {
        self.max_enemies_allowed
    }

    /// Clears the goal count and any recorded outcome.
    pub fn reset(&mut self) {
        self.goal_reach_count = 0;
        self.outcome = None;
    }

    fn finish(&mut self, outcome: MatchOutcome, out_events: &mut Vec<Event>) {
        self.outcome = Some(outcome);
        info!(
            target: "td.outcome",
            ?outcome,
            goal_reach_count = self.goal_reach_count,
            "match ended"
        );
        out_events.push(Event::MatchEnded { outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ended(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, Event::MatchEnded { .. }))
            .count()
    }

    #[test]
    fn defeat_fires_on_tenth_arrival_only() {
        let mut tracker = OutcomeTracker::new(10);
        let mut events = Vec::new();

        for _ in 0..9 {
            tracker.report_goal_reached(&mut events);
        }
        assert!(!tracker.is_over());
        assert_eq!(ended(&events), 0);

        tracker.report_goal_reached(&mut events);
        assert!(tracker.is_over());
        assert_eq!(tracker.outcome(), Some(MatchOutcome::Defeat));
        assert_eq!(tracker.goal_reach_count(), 10);

        events.clear();
        tracker.report_goal_reached(&mut events);
        assert!(events.is_empty());
        assert_eq!(tracker.goal_reach_count(), 10);
    }

    #[test]
    fn terminal_state_is_idempotent() {
        let mut tracker = OutcomeTracker::new(3);
        let mut events = Vec::new();

        tracker.report_victory(&mut events);
        tracker.report_victory(&mut events);
        tracker.report_goal_reached(&mut events);

        assert_eq!(
            events,
            vec![Event::MatchEnded {
                outcome: MatchOutcome::Victory,
            }]
        );
        assert_eq!(tracker.goal_reach_count(), 0);
        assert_eq!(tracker.outcome(), Some(MatchOutcome::Victory));
    }

    #[test]
    fn arrivals_report_running_count() {
        let mut tracker = OutcomeTracker::new(4);
        let mut events = Vec::new();

        tracker.report_goal_reached(&mut events);
        tracker.report_goal_reached(&mut events);

        assert_eq!(
            events.last(),
            Some(&Event::GoalReached {
                count: 2,
                max_allowed: 4,
            })
        );
    }

    #[test]
    fn reset_reopens_the_match() {
        let mut tracker = OutcomeTracker::new(1);
        let mut events = Vec::new();
        tracker.report_goal_reached(&mut events);
        assert!(tracker.is_over());

        tracker.reset();

        assert!(!tracker.is_over());
        assert_eq!(tracker.goal_reach_count(), 0);
    }
}
