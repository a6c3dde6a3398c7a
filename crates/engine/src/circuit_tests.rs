use std::time::Duration;

use todoat_core::FakeClock;

use super::*;

fn breaker(clock: FakeClock) -> CircuitBreaker<FakeClock> {
    CircuitBreaker::new(3, Duration::from_secs(30), clock)
}

#[test]
fn starts_closed_and_allows_calls() {
    let breaker = breaker(FakeClock::new());
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert!(breaker.allow());
}

#[test]
fn opens_exactly_on_the_nth_failure() {
    let breaker = breaker(FakeClock::new());
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Closed);
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Closed);
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(breaker.failure_count(), 3);
}

#[test]
fn open_denies_calls_until_cooldown_elapses() {
    let clock = FakeClock::new();
    let breaker = breaker(clock.clone());
    for _ in 0..3 {
        breaker.record_failure();
    }
    assert!(!breaker.allow());

    clock.advance(Duration::from_secs(29));
    assert!(!breaker.allow());

    clock.advance(Duration::from_secs(1));
    assert!(breaker.allow());
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
}

#[test]
fn half_open_success_returns_to_closed_with_zero_failures() {
    let clock = FakeClock::new();
    let breaker = breaker(clock.clone());
    for _ in 0..3 {
        breaker.record_failure();
    }
    clock.advance(Duration::from_secs(30));
    assert!(breaker.allow());
    breaker.record_success();
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.failure_count(), 0);
}

#[test]
fn half_open_failure_reopens_and_resets_the_cooldown_clock() {
    let clock = FakeClock::new();
    let breaker = breaker(clock.clone());
    for _ in 0..3 {
        breaker.record_failure();
    }
    clock.advance(Duration::from_secs(30));
    assert!(breaker.allow());
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    assert!(!breaker.allow());
    clock.advance(Duration::from_secs(30));
    assert!(breaker.allow());
}

#[test]
fn record_success_from_closed_keeps_failure_count_at_zero() {
    let breaker = breaker(FakeClock::new());
    breaker.record_failure();
    breaker.record_success();
    assert_eq!(breaker.failure_count(), 0);
    assert_eq!(breaker.state(), CircuitState::Closed);
}
