use gw_registry::InstanceState;

use super::*;

#[test]
fn start_registers_and_shutdown_unregisters() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("GW_STATE_DIR", dir.path());

    let handle = RegistrationHandle::start("test-context".to_string(), vec!["interactive".to_string()], 4242)
        .expect("registry should be reachable under a temp GW_STATE_DIR");

    let registry = InstanceRegistry::open().unwrap();
    let instances = registry.list_instances().unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].pid, std::process::id());
    assert_eq!(instances[0].state, InstanceState::LiveNoProject);

    handle.update_project(Some("demo".to_string()), Some("/tmp/demo".to_string()));
    let instances = registry.list_instances().unwrap();
    assert_eq!(instances[0].state, InstanceState::LiveWithProject);

    handle.shutdown();
    assert!(registry.list_instances().unwrap().is_empty());

    std::env::remove_var("GW_STATE_DIR");
}
