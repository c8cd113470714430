use dynfilter::{
    ErrorKind,
    cache::{CacheScope, CacheSettings},
    config::{ConfigError, load_path, load_str},
};
use std::time::Duration;

#[test]
fn full_section_is_loaded() {
    let settings = load_str(
        r#"
        [dynamic_filter]
        cache_ttl = 300
        max_options = 50
        cache_scope = "tenant"
        tenant_key = "acme"
        "#,
    )
    .expect("valid config");

    assert_eq!(settings.ttl(), Some(Duration::from_secs(300)));
    assert_eq!(settings.option_limit(), Some(50));
    assert_eq!(settings.cache_scope, CacheScope::Tenant);
    assert_eq!(settings.tenant_key.as_deref(), Some("acme"));
}

#[test]
fn missing_section_yields_defaults() {
    let settings = load_str("[server]\nport = 8080\n").expect("valid config");

    assert_eq!(settings, CacheSettings::default());
    assert_eq!(settings.ttl(), None);
    assert_eq!(settings.cache_scope, CacheScope::User);
}

#[test]
fn non_positive_values_disable_caching_and_limits() {
    let settings = load_str("[dynamic_filter]\ncache_ttl = -1\nmax_options = 0\n")
        .expect("valid config");

    assert_eq!(settings.ttl(), None);
    assert_eq!(settings.option_limit(), None);
}

#[test]
fn unknown_scope_is_rejected() {
    let err = load_str("[dynamic_filter]\ncache_scope = \"team\"\n").expect_err("bad scope");

    assert!(matches!(err, ConfigError::InvalidScope(_)));
    assert_eq!(dynfilter::Error::from(err).kind, ErrorKind::Config);
}

#[test]
fn unknown_keys_and_bad_types_fail_to_parse() {
    assert!(matches!(
        load_str("[dynamic_filter]\ncache_tll = 10\n"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        load_str("[dynamic_filter]\ncache_ttl = \"ten\"\n"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn missing_file_reports_path() {
    let err = load_path("/nonexistent/dynfilter.toml").expect_err("missing file");

    assert!(err.to_string().contains("/nonexistent/dynfilter.toml"));
}
