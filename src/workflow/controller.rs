//! Stop/continue decision after each candidate, and cursor advancement.

use crate::domain::{CandidateCursor, DecisionOutcome};

/// Non-accept outcomes tolerated before the search stops
pub const DEFAULT_REJECTION_BUDGET: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The latest candidate was accepted
    Accepted,
    /// The decision log reached the budget
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopDecision {
    Stop(StopCause),
    Continue,
}

/// Decides whether the candidate loop ends after a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopController {
    budget: usize,
}

impl Default for LoopController {
    fn default() -> Self {
        Self::new(DEFAULT_REJECTION_BUDGET)
    }
}

impl LoopController {
    pub fn new(budget: usize) -> Self {
        Self { budget: budget.max(1) }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// `outcome` is the decision just made; `log` already includes it.
    ///
    /// Acceptance wins over the budget. The log only ever holds non-accept
    /// entries before the last one, so its length is the hold/reject count.
    pub fn decide(&self, outcome: DecisionOutcome, log: &[DecisionOutcome]) -> LoopDecision {
        if outcome.is_accept() {
            LoopDecision::Stop(StopCause::Accepted)
        } else if log.len() >= self.budget {
            LoopDecision::Stop(StopCause::BudgetExhausted)
        } else {
            LoopDecision::Continue
        }
    }
}

/// Moves the cursor through the ranked list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateAdvancer;

impl CandidateAdvancer {
    /// Next index, or `Exhausted` when it would run past the end
    pub fn advance(&self, ranked_len: usize, cursor: CandidateCursor) -> CandidateCursor {
        match cursor {
            CandidateCursor::Active(idx) if idx + 1 < ranked_len => CandidateCursor::Active(idx + 1),
            _ => CandidateCursor::Exhausted,
        }
    }

    pub fn has_remaining(&self, cursor: CandidateCursor) -> bool {
        matches!(cursor, CandidateCursor::Active(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DecisionOutcome::*;

    #[test]
    fn test_accept_stops_immediately() {
        let controller = LoopController::default();
        assert_eq!(controller.decide(Accept, &[Accept]), LoopDecision::Stop(StopCause::Accepted));
        assert_eq!(
            controller.decide(Accept, &[Reject, Hold, Reject, Hold, Accept]),
            LoopDecision::Stop(StopCause::Accepted)
        );
    }

    #[test]
    fn test_budget_stops_at_five() {
        let controller = LoopController::default();
        assert_eq!(controller.decide(Hold, &[Hold; 4]), LoopDecision::Continue);
        assert_eq!(
            controller.decide(Hold, &[Hold; 5]),
            LoopDecision::Stop(StopCause::BudgetExhausted)
        );
    }

    #[test]
    fn test_continue_below_budget() {
        let controller = LoopController::default();
        assert_eq!(controller.decide(Reject, &[Reject]), LoopDecision::Continue);
        assert_eq!(controller.decide(Hold, &[Reject, Hold]), LoopDecision::Continue);
    }

    #[test]
    fn test_custom_budget() {
        let controller = LoopController::new(2);
        assert_eq!(
            controller.decide(Reject, &[Hold, Reject]),
            LoopDecision::Stop(StopCause::BudgetExhausted)
        );
        assert_eq!(LoopController::new(0).budget(), 1);
    }

    #[test]
    fn test_advance_within_bounds() {
        let advancer = CandidateAdvancer;
        assert_eq!(advancer.advance(3, CandidateCursor::Active(0)), CandidateCursor::Active(1));
        assert_eq!(advancer.advance(3, CandidateCursor::Active(1)), CandidateCursor::Active(2));
    }

    #[test]
    fn test_advance_past_last_is_exhausted() {
        let advancer = CandidateAdvancer;
        let next = advancer.advance(3, CandidateCursor::Active(2));
        assert_eq!(next, CandidateCursor::Exhausted);
        assert!(!advancer.has_remaining(next));
    }

    #[test]
    fn test_advance_from_exhausted_stays_exhausted() {
        let advancer = CandidateAdvancer;
        assert_eq!(advancer.advance(3, CandidateCursor::Exhausted), CandidateCursor::Exhausted);
        assert_eq!(advancer.advance(0, CandidateCursor::Active(0)), CandidateCursor::Exhausted);
    }

    #[test]
    fn test_has_remaining() {
        let advancer = CandidateAdvancer;
        assert!(advancer.has_remaining(CandidateCursor::Active(0)));
        assert!(!advancer.has_remaining(CandidateCursor::Exhausted));
    }
}
