use super::*;

#[test]
fn defaults_are_sane_when_env_unset() {
    // SAFETY-equivalent: not actually unsafe, just racy under parallel test
    // execution if another test also mutates these vars. None currently does.
    std::env::remove_var("GW_BIND_ADDR");
    std::env::remove_var("GW_CONTEXT_NAME");
    std::env::remove_var("GW_DEFAULT_MODES");

    let cfg = ServerConfig::from_env();
    assert_eq!(cfg.bind_addr, "127.0.0.1:0");
    assert_eq!(cfg.context_name, DEFAULT_CONTEXT_NAME);
    assert_eq!(cfg.default_modes, vec!["interactive".to_string()]);
}

#[test]
fn default_modes_parses_comma_separated_list() {
    std::env::set_var("GW_DEFAULT_MODES", "interactive, editing ,review");
    let cfg = ServerConfig::from_env();
    assert_eq!(cfg.default_modes, vec!["interactive", "editing", "review"]);
    std::env::remove_var("GW_DEFAULT_MODES");
}
