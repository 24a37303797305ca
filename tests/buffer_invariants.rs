//! Rolling buffer invariants over a sweep of capacities and sample sequences

use telemetry_dash::telemetry::RollingBuffer;
use telemetry_dash::wire::protocol::Sample;

fn rpm_sample(value: Option<f64>) -> Sample {
    value.map(|v| ("RPM".to_string(), v)).into_iter().collect()
}

/// Deterministic two-decimal values, like the wire format carries
fn wire_value(i: usize) -> f64 {
    ((i * 7919 + 13) % 100_000) as f64 / 100.0 - 500.0
}

/// Same sequence with every fifth sample missing the field
fn sparse_value(i: usize) -> Option<f64> {
    (i % 5 != 3).then(|| wire_value(i))
}

#[test]
fn capacity_never_exceeded_and_order_kept() {
    for capacity in 1..=12 {
        for total in 0..40 {
            let mut buffer = RollingBuffer::new(capacity);
            for i in 0..total {
                buffer.add(rpm_sample(Some(wire_value(i))));
                assert!(buffer.len() <= capacity);
            }

            let kept = total.min(capacity);
            assert_eq!(buffer.len(), kept);

            let expected: Vec<Option<f64>> = (total - kept..total).map(|i| Some(wire_value(i))).collect();
            assert_eq!(buffer.window("RPM", 0), expected, "capacity {} total {}", capacity, total);
        }
    }
}

#[test]
fn statistics_match_window() {
    for capacity in 1..=16 {
        let mut buffer = RollingBuffer::new(capacity);

        for i in 0..120 {
            buffer.add(rpm_sample(sparse_value(i)));

            let present: Vec<f64> = buffer.window("RPM", 0).into_iter().flatten().collect();
            assert_eq!(buffer.count("RPM"), present.len());

            if present.is_empty() {
                assert_eq!(buffer.min("RPM"), None);
                assert_eq!(buffer.avg("RPM"), None);
                assert_eq!(buffer.max("RPM"), None);
                continue;
            }

            let min = present.iter().copied().fold(f64::INFINITY, f64::min);
            let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = present.iter().sum::<f64>() / present.len() as f64;

            assert_eq!(buffer.min("RPM"), Some(min));
            assert_eq!(buffer.max("RPM"), Some(max));

            let buffered_avg = buffer.avg("RPM").unwrap();
            assert!((buffered_avg - avg).abs() < 1e-6, "avg {} vs {}", buffered_avg, avg);
            assert!(min <= buffered_avg && buffered_avg <= max);
        }
    }
}

#[test]
fn aggregates_survive_long_runs() {
    // Many evictions: running sums must not drift away from the window
    let mut buffer = RollingBuffer::new(50);
    for i in 0..100_000 {
        buffer.add(rpm_sample(Some(wire_value(i))));
    }

    let window: Vec<f64> = buffer.window("RPM", 0).into_iter().flatten().collect();
    let avg = window.iter().sum::<f64>() / window.len() as f64;
    assert!((buffer.avg("RPM").unwrap() - avg).abs() < 1e-6);
}

#[test]
fn window_length_is_bounded() {
    for capacity in 1..=10 {
        for added in 0..20 {
            let mut buffer = RollingBuffer::new(capacity);
            for i in 0..added {
                buffer.add(rpm_sample(Some(i as f64)));
            }

            for count in 0..25 {
                let expected = if count == 0 { buffer.len() } else { count.min(buffer.len()) };
                assert_eq!(buffer.window("RPM", count).len(), expected);
                assert_eq!(buffer.window("Speed", count), vec![None; expected]);
            }
        }
    }
}

#[test]
fn reset_clears_everything() {
    let mut buffer = RollingBuffer::new(16);
    for i in 0..50 {
        buffer.add(rpm_sample(Some(wire_value(i))));
    }

    buffer.reset();
    assert!(buffer.is_empty());
    assert!(!buffer.is_seen("RPM"));
    assert_eq!(buffer.last("RPM"), None);
    assert_eq!(buffer.avg("RPM"), None);
    assert!(buffer.window("RPM", 0).is_empty());

    buffer.add(rpm_sample(Some(7.0)));
    assert_eq!(buffer.min("RPM"), Some(7.0));
    assert_eq!(buffer.avg("RPM"), Some(7.0));
    assert_eq!(buffer.max("RPM"), Some(7.0));
}
