use super::*;

fn claim(id: &str, worker: &str, age: Duration, now: Instant) -> Claim {
    Claim { operation_id: id.into(), worker_id: worker.into(), claimed_at: now - age }
}

#[yare::parameterized(
    older_and_dead_is_stuck = { Duration::from_secs(11 * 60), false, true },
    older_but_alive_is_not_stuck = { Duration::from_secs(11 * 60), true, false },
    fresh_and_dead_is_not_stuck = { Duration::from_secs(60), false, false },
    exactly_at_threshold_and_dead_is_stuck = { Duration::from_secs(10 * 60), false, true },
)]
fn stuck_operations_combines_age_and_liveness(age: Duration, worker_alive: bool, expect_stuck: bool) {
    let now = Instant::now();
    let claims = vec![claim("op1", "w1", age, now)];
    let stuck = stuck_operations(&claims, now, Duration::from_secs(10 * 60), |_| worker_alive);
    assert_eq!(!stuck.is_empty(), expect_stuck);
}
