use std::process::{Command, Stdio};

use gw_core::clock::SystemClock;
use gw_registry::{InstanceRegistry, LifecycleEventType};
use tempfile::TempDir;

use super::*;

fn new_registry() -> (InstanceRegistry<SystemClock>, TempDir) {
    let dir = TempDir::new().unwrap();
    (InstanceRegistry::open_in(dir.path(), SystemClock).unwrap(), dir)
}

fn spawn_sleeper() -> std::process::Child {
    Command::new("sleep")
        .arg("30")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawning /bin/sleep for a killer test")
}

#[tokio::test]
async fn force_kill_on_unknown_pid_is_not_found() {
    let (registry, _dir) = new_registry();
    let outcome = force_kill(&registry, 999_999).await;
    assert_eq!(outcome, ForceKillOutcome::NotFound);
}

#[tokio::test]
async fn force_kill_refuses_a_live_instance() {
    let (registry, _dir) = new_registry();
    registry.register(1234, 1, None, vec![]).unwrap();

    let outcome = force_kill(&registry, 1234).await;
    assert_eq!(outcome, ForceKillOutcome::NotZombie);
    assert_eq!(registry.get_instance(1234).unwrap().unwrap().state, InstanceState::LiveNoProject);
}

#[tokio::test]
async fn force_kill_terminates_a_zombie_process_with_sigterm() {
    let mut child = spawn_sleeper();
    let pid = child.id();

    let (registry, _dir) = new_registry();
    registry.register(pid, 1, None, vec![]).unwrap();
    registry.mark_zombie(pid).unwrap();

    let outcome = force_kill(&registry, pid).await;
    assert_eq!(outcome, ForceKillOutcome::Killed);
    assert!(!is_alive(pid));
    assert!(registry.get_instance(pid).unwrap().is_none());

    let _ = child.wait();
}

#[tokio::test]
async fn force_kill_records_outcome_via_lifecycle_event() {
    let mut child = spawn_sleeper();
    let pid = child.id();

    let (registry, _dir) = new_registry();
    registry.register(pid, 1, None, vec![]).unwrap();
    registry.mark_zombie(pid).unwrap();

    force_kill(&registry, pid).await;

    let events = registry.get_lifecycle_events(10).unwrap();
    assert!(events.iter().any(|e| e.event_type == LifecycleEventType::ZombieForceKilled));

    let _ = child.wait();
}
