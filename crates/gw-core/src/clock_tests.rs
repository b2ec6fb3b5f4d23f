use super::*;

#[test]
fn fake_clock_advances_both_readings() {
    let clock = FakeClock::new();
    let before = clock.now();
    let before_epoch = clock.epoch_ms();
    clock.advance(Duration::from_secs(5));
    assert!(clock.now() > before);
    assert_eq!(clock.epoch_ms(), before_epoch + 5_000);
}

#[test]
fn system_clock_epoch_ms_is_plausible() {
    let clock = SystemClock;
    // Anything after 2021-01-01 in epoch millis.
    assert!(clock.epoch_ms() > 1_600_000_000_000);
}
