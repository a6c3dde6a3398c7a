use super::*;

#[test]
fn shuts_down_once_threshold_consecutive_failures_accumulate() {
    let cutoff = ConsecutiveErrorCutoff::new(5);
    for _ in 0..4 {
        assert_eq!(cutoff.record_failure(), CutoffOutcome::Continue);
    }
    assert_eq!(cutoff.record_failure(), CutoffOutcome::ShutDown);
}

#[test]
fn any_success_resets_the_counter() {
    let cutoff = ConsecutiveErrorCutoff::new(5);
    for _ in 0..4 {
        cutoff.record_failure();
    }
    cutoff.record_success();
    assert_eq!(cutoff.count(), 0);
    for _ in 0..4 {
        assert_eq!(cutoff.record_failure(), CutoffOutcome::Continue);
    }
}

#[test]
fn default_threshold_matches_documented_constant() {
    let cutoff = ConsecutiveErrorCutoff::with_default_threshold();
    assert_eq!(cutoff.threshold, 5);
}
