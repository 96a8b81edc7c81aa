//! Verification attempt limiting, backed by governor.
//!
//! Every inbound notification consumes one unit from a counter keyed by
//! gateway variant, before any validation or signature work. The budget
//! bounds total verification attempts over a 24-hour window, not just
//! failures.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::error::{KassaflowError, Result};
use crate::gateway::GatewayKind;

/// Rolling window over which a gateway's attempt budget applies.
pub const ATTEMPT_WINDOW: Duration = Duration::from_secs(60 * 60 * 24);

/// Port for the shared attempt counter.
///
/// Implementations must be atomic and visible across concurrent requests
/// for the same key.
#[async_trait]
pub trait AttemptLimiter: Send + Sync {
    /// Consume one unit from the counter for `kind`, budget `attempts`
    /// per [`ATTEMPT_WINDOW`]. Fails with `RateLimited` once exhausted.
    async fn try_acquire(&self, kind: GatewayKind, attempts: u32) -> Result<()>;
}

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// In-process attempt limiter using governor's lock-free GCRA state.
///
/// One limiter per gateway kind, created on first use. The budget is fixed
/// by configuration for the process lifetime, so the quota a key was
/// created with is never rebuilt.
#[derive(Default)]
pub struct GovernorAttemptLimiter {
    limiters: Mutex<HashMap<GatewayKind, Arc<Limiter>>>,
}

impl GovernorAttemptLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn limiter_for(&self, kind: GatewayKind, attempts: u32) -> Arc<Limiter> {
        let mut limiters = self.limiters.lock().expect("limiter map lock poisoned");
        limiters
            .entry(kind)
            .or_insert_with(|| Arc::new(RateLimiter::direct(attempt_quota(attempts))))
            .clone()
    }
}

/// GCRA quota granting `attempts` per rolling [`ATTEMPT_WINDOW`]: the full
/// budget is available up front, and one cell replenishes every
/// window/attempts so the sustained rate stays at the budget per window.
fn attempt_quota(attempts: u32) -> Quota {
    let burst = NonZeroU32::new(attempts.max(1)).expect("attempts is positive");
    Quota::with_period(ATTEMPT_WINDOW / burst.get())
        .expect("replenish interval is positive")
        .allow_burst(burst)
}

#[async_trait]
impl AttemptLimiter for GovernorAttemptLimiter {
    async fn try_acquire(&self, kind: GatewayKind, attempts: u32) -> Result<()> {
        let limiter = self.limiter_for(kind, attempts);
        limiter.check().map_err(|_| {
            tracing::warn!(gateway = %kind, budget = attempts, "Attempt budget exhausted");
            KassaflowError::RateLimited(kind)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_budget_allows_exactly_n_attempts() {
        let limiter = GovernorAttemptLimiter::new();

        for i in 0..5 {
            assert!(
                limiter.try_acquire(GatewayKind::MegaKassa, 5).await.is_ok(),
                "attempt {} should be within budget",
                i + 1
            );
        }

        let err = limiter
            .try_acquire(GatewayKind::MegaKassa, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, KassaflowError::RateLimited(GatewayKind::MegaKassa)));
    }

    #[tokio::test]
    async fn test_gateway_kinds_have_isolated_budgets() {
        let limiter = GovernorAttemptLimiter::new();

        limiter.try_acquire(GatewayKind::MegaKassa, 1).await.unwrap();
        assert!(limiter.try_acquire(GatewayKind::MegaKassa, 1).await.is_err());

        // TopKassa's counter is untouched.
        assert!(limiter.try_acquire(GatewayKind::TopKassa, 1).await.is_ok());
    }

    #[test]
    fn test_budget_is_fully_restored_after_a_window() {
        use governor::clock::FakeRelativeClock;

        let clock = FakeRelativeClock::default();
        let limiter = RateLimiter::direct_with_clock(attempt_quota(3), &clock);

        for _ in 0..3 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err(), "budget exhausted");

        clock.advance(ATTEMPT_WINDOW);
        let granted = (0..3).filter(|_| limiter.check().is_ok()).count();
        assert_eq!(granted, 3, "full budget available one window later");
    }

    #[test]
    fn test_budget_replenishes_gradually_within_a_window() {
        use governor::clock::FakeRelativeClock;

        let clock = FakeRelativeClock::default();
        let limiter = RateLimiter::direct_with_clock(attempt_quota(4), &clock);

        for _ in 0..4 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());

        // A quarter of the window restores one of four cells.
        clock.advance(ATTEMPT_WINDOW / 4);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[tokio::test]
    async fn test_limiter_is_shared_across_clones_of_the_arc() {
        let limiter = Arc::new(GovernorAttemptLimiter::new());

        let a = limiter.clone();
        a.try_acquire(GatewayKind::TopKassa, 2).await.unwrap();
        let b = limiter.clone();
        b.try_acquire(GatewayKind::TopKassa, 2).await.unwrap();

        assert!(limiter.try_acquire(GatewayKind::TopKassa, 2).await.is_err());
    }
}
