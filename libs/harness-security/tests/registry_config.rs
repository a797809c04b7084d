#![allow(clippy::unwrap_used, clippy::expect_used)]

use harness_security::{IdentityConfig, IdentityRegistry};
use secrecy::ExposeSecret;

#[test]
fn registry_loads_from_json_config() {
    let raw = r#"[
        {"username": "alice", "password": "pw1", "roles": ["developer"], "teams": ["ml-team"]},
        {"username": "bob", "password": "pw2"}
    ]"#;
    let configs: Vec<IdentityConfig> = serde_json::from_str(raw).unwrap();
    let registry = IdentityRegistry::from_configs(&configs).unwrap();

    assert_eq!(registry.len(), 2);
    let alice = registry.get("alice").unwrap();
    assert!(alice.has_role("developer"));
    assert_eq!(alice.password().expose_secret(), "pw1");

    let bob = registry.get("bob").unwrap();
    assert!(bob.roles().is_empty());
    assert!(bob.teams().is_empty());
}

#[test]
fn unknown_config_fields_are_rejected() {
    let raw = r#"{"username": "alice", "password": "pw", "group": "x"}"#;
    assert!(serde_json::from_str::<IdentityConfig>(raw).is_err());
}

#[test]
fn blank_username_is_rejected() {
    let cfgs = vec![IdentityConfig::new("  ", "pw", &[], &[])];
    assert!(IdentityRegistry::from_configs(&cfgs).is_err());
}
