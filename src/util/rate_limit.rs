//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::ws::protocol::InputKind;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Per-connection inbound message limiter
#[derive(Clone)]
pub struct PlayerRateLimiter {
    input_limiter: Arc<Limiter>,
}

impl PlayerRateLimiter {
    pub fn new(messages_per_second: u32) -> Self {
        Self {
            input_limiter: create_limiter(messages_per_second),
        }
    }

    /// Check if a message is allowed (returns true if allowed)
    pub fn check_input(&self) -> bool {
        self.input_limiter.check().is_ok()
    }

    /// Check a decoded input. Jumps are edge-triggered and never dropped;
    /// they still draw from the budget so a jump flood throttles movement.
    pub fn check_input_kind(&self, input: InputKind) -> bool {
        let allowed = self.check_input();
        allowed || input == InputKind::Jump
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_INPUT_RATE_LIMIT;

    #[test]
    fn test_burst_then_limited() {
        let limiter = PlayerRateLimiter::new(3);
        assert!(limiter.check_input());
        assert!(limiter.check_input());
        assert!(limiter.check_input());
        assert!(!limiter.check_input());
    }

    #[test]
    fn test_zero_rate_still_allows_one() {
        let limiter = PlayerRateLimiter::new(0);
        assert!(limiter.check_input());
    }

    #[test]
    fn test_jump_admitted_when_budget_exhausted() {
        let limiter = PlayerRateLimiter::new(2);
        assert!(limiter.check_input_kind(InputKind::Right));
        assert!(limiter.check_input_kind(InputKind::Right));
        assert!(!limiter.check_input_kind(InputKind::Left));
        assert!(!limiter.check_input_kind(InputKind::StopHorizontal));
        for _ in 0..10 {
            assert!(limiter.check_input_kind(InputKind::Jump));
        }
    }

    #[test]
    fn test_default_budget_covers_high_refresh_client() {
        // One second of key-repeat from a 144 Hz client plus a jump every frame
        let limiter = PlayerRateLimiter::new(DEFAULT_INPUT_RATE_LIMIT);
        for _ in 0..144 {
            assert!(limiter.check_input_kind(InputKind::Right));
        }
        for _ in 0..60 {
            assert!(limiter.check_input_kind(InputKind::Jump));
        }
        assert!(limiter.check_input_kind(InputKind::StopHorizontal));
    }
}
