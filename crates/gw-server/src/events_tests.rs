use super::*;
use serde_json::json;

fn event(n: u8) -> LifecycleEvent {
    LifecycleEvent {
        timestamp: n as f64,
        event_type: EventType::ToolExecuted,
        session_id: None,
        details: json!({ "n": n }),
    }
}

#[test]
fn ring_drops_oldest_past_capacity() {
    let log = LifecycleLog::default();
    for n in 0..(MAX_LIFECYCLE_EVENTS as u16 + 10) {
        log.push(event((n % 255) as u8));
    }
    let recent = log.recent(MAX_LIFECYCLE_EVENTS);
    assert_eq!(recent.len(), MAX_LIFECYCLE_EVENTS);
}

#[yare::parameterized(
    fewer_than_pushed  = { 3, vec![2.0, 3.0, 4.0] },
    exactly_pushed     = { 5, vec![0.0, 1.0, 2.0, 3.0, 4.0] },
    more_than_pushed   = { 10, vec![0.0, 1.0, 2.0, 3.0, 4.0] },
    zero               = { 0, vec![] },
)]
fn recent_returns_newest_n_in_order(n: usize, expected: Vec<f64>) {
    let log = LifecycleLog::default();
    for n in 0..5u8 {
        log.push(event(n));
    }
    let recent = log.recent(n);
    let timestamps: Vec<f64> = recent.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, expected);
}
