use std::time::Duration;

use pretty_assertions::assert_eq;
use probe_core::PacingPolicy;

#[test]
fn steady_first_admission_is_immediate() {
    let policy = PacingPolicy::steady(Duration::from_millis(250));
    assert_eq!(policy.gap_before(0), Duration::ZERO);
    assert_eq!(policy.gap_before(1), Duration::from_millis(250));
    assert_eq!(policy.gap_before(42), Duration::from_millis(250));
}

#[test]
fn steady_minimum_time_is_interval_times_n_minus_one() {
    let policy = PacingPolicy::steady(Duration::from_millis(100));
    assert_eq!(policy.minimum_admission_time(0), Duration::ZERO);
    assert_eq!(policy.minimum_admission_time(1), Duration::ZERO);
    assert_eq!(policy.minimum_admission_time(5), Duration::from_millis(400));
    assert_eq!(policy.expected_pauses(5), 4);
}

#[test]
fn steady_with_zero_interval_never_pauses() {
    let policy = PacingPolicy::steady(Duration::ZERO);
    assert_eq!(policy.expected_pauses(100), 0);
}

#[test]
fn batch_pauses_only_on_batch_boundaries() {
    let policy = PacingPolicy::batch(3, Duration::from_secs(2));
    let gaps: Vec<Duration> = (0..7).map(|n| policy.gap_before(n)).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::ZERO,
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(2),
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(2),
        ]
    );
}

#[test]
fn batch_pause_count_is_ceil_n_over_b_minus_one() {
    let policy = PacingPolicy::batch(4, Duration::from_millis(500));
    assert_eq!(policy.expected_pauses(0), 0);
    assert_eq!(policy.expected_pauses(1), 0);
    assert_eq!(policy.expected_pauses(4), 0);
    assert_eq!(policy.expected_pauses(5), 1);
    assert_eq!(policy.expected_pauses(8), 1);
    assert_eq!(policy.expected_pauses(9), 2);
    assert_eq!(policy.minimum_admission_time(9), Duration::from_secs(1));
}

#[test]
fn batch_of_zero_does_not_divide_by_zero() {
    let policy = PacingPolicy::Batch {
        size: 0,
        pause_ms: 10,
    };
    assert_eq!(policy.gap_before(3), Duration::from_millis(10));
}

#[test]
fn oversized_durations_saturate_instead_of_wrapping() {
    assert_eq!(
        PacingPolicy::steady(Duration::MAX),
        PacingPolicy::Steady {
            interval_ms: u64::MAX
        }
    );
    assert_eq!(
        PacingPolicy::batch(2, Duration::MAX),
        PacingPolicy::Batch {
            size: 2,
            pause_ms: u64::MAX
        }
    );
}
