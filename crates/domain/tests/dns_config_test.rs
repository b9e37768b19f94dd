use ferrous_sip_domain::{Config, DnsConfig};

#[test]
fn test_config_default_values() {
    let config = DnsConfig::default();

    assert_eq!(config.query_timeout_ms, 2000);
    assert_eq!(config.ttl_ceiling_minutes, 60);
    assert_eq!(config.max_cache_entries, 512);
    assert_eq!(config.command_queue_capacity, 1024);
    assert!(config.tcp_fallback);
    assert_eq!(config.upstreams().unwrap().len(), 2);
}

#[test]
fn test_config_deserialization_fills_defaults() {
    let toml_str = r#"
        [dns]
        upstream_servers = ["tcp://10.0.0.53:53"]
        max_cache_entries = 64

        [[sip.credentials]]
        realm = "example.com"
        username = "alice"
        password = "secret"
    "#;

    let config = Config::from_toml(toml_str).unwrap();
    assert_eq!(config.dns.max_cache_entries, 64);
    assert_eq!(config.dns.ttl_ceiling_minutes, 60);
    assert_eq!(config.sip.credentials.len(), 1);
    assert_eq!(config.sip.credentials[0].username, "alice");
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_bad_upstream() {
    let mut config = Config::default();
    config.dns.upstream_servers = vec!["doq://1.1.1.1:853".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_cache() {
    let mut config = Config::default();
    config.dns.max_cache_entries = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_credential_debug_redacts_password() {
    let config = Config::from_toml(
        r#"
        [[sip.credentials]]
        realm = "r"
        username = "u"
        password = "hunter2"
    "#,
    )
    .unwrap();
    let debug = format!("{:?}", config.sip.credentials[0]);
    assert!(!debug.contains("hunter2"));
}
