use digit_pad::canvas::debounce::{DebounceTimer, QUIET_PERIOD};
use std::time::{Duration, Instant};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn quiet_period_matches_contract() {
    assert_eq!(QUIET_PERIOD, ms(300));
}

#[test]
fn burst_then_silence_fires_exactly_once() {
    let mut timer = DebounceTimer::new();
    let t0 = Instant::now();

    timer.schedule(t0);
    timer.schedule(t0 + ms(50));
    timer.schedule(t0 + ms(100));

    assert!(!timer.poll(t0 + ms(399)));
    assert!(timer.poll(t0 + ms(400)));
    // Consumed; nothing fires again without new activity.
    assert!(!timer.poll(t0 + ms(900)));
    assert!(!timer.pending());
}

#[test]
fn rapid_extensions_coalesce_into_one_trigger_after_the_final_event() {
    let mut timer = DebounceTimer::new();
    let t0 = Instant::now();

    // Events every 100ms; every inter-event gap is below the quiet period.
    for i in 0..10u64 {
        let t = t0 + ms(i * 100);
        timer.schedule(t);
        assert!(!timer.poll(t + ms(99)), "fired between events at i={i}");
    }

    // The pending deadline belongs to the final event at t0+900ms.
    assert!(!timer.poll(t0 + ms(1199)));
    assert!(timer.poll(t0 + ms(1200)));
    assert!(!timer.poll(t0 + ms(5000)));
}

#[test]
fn never_fires_on_the_leading_edge() {
    let mut timer = DebounceTimer::new();
    let t0 = Instant::now();
    timer.schedule(t0);
    assert!(!timer.poll(t0));
    assert!(!timer.poll(t0 + ms(1)));
}

#[test]
fn cancel_leaves_no_deadline_that_could_double_fire() {
    let mut timer = DebounceTimer::new();
    let t0 = Instant::now();

    // Stroke end cancels the pending deadline; the caller fires immediately.
    timer.schedule(t0 + ms(100));
    assert!(timer.pending());
    timer.cancel();
    assert!(!timer.pending());
    assert!(!timer.poll(t0 + ms(10_000)));
}

#[test]
fn at_most_one_deadline_is_ever_pending() {
    let mut timer = DebounceTimer::new();
    let t0 = Instant::now();
    timer.schedule(t0);
    timer.schedule(t0 + ms(200));
    // The first deadline (t0+300) was replaced, so nothing fires at t0+300.
    assert!(!timer.poll(t0 + ms(300)));
    assert!(timer.poll(t0 + ms(500)));
}

#[test]
fn time_remaining_reports_the_pending_deadline() {
    let mut timer = DebounceTimer::with_quiet_period(ms(300));
    let t0 = Instant::now();
    assert_eq!(timer.time_remaining(t0), None);
    timer.schedule(t0);
    assert_eq!(timer.time_remaining(t0 + ms(100)), Some(ms(200)));
    assert_eq!(timer.time_remaining(t0 + ms(400)), Some(ms(0)));
}
