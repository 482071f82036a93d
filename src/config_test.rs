use super::*;
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// # Safety
/// Callers hold `env_lock()` so no other test touches these vars concurrently.
unsafe fn clear_portal_env() {
    unsafe {
        std::env::remove_var("PORTAL_API_BASE_URL");
        std::env::remove_var("PORTAL_STATE_DIR");
        std::env::remove_var("PORTAL_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("PORTAL_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_defaults() {
    let _env = env_lock();
    unsafe { clear_portal_env() };

    let cfg = PortalConfig::from_env().unwrap();
    assert_eq!(cfg, PortalConfig::default());
    assert_eq!(cfg.api_base_url, "http://localhost:3000");
    assert_eq!(cfg.state_dir, PathBuf::from(".portal"));
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 30, connect_secs: 10 });
}

#[test]
fn from_env_overrides() {
    let _env = env_lock();
    unsafe {
        clear_portal_env();
        std::env::set_var("PORTAL_API_BASE_URL", "https://pdao.example.test/");
        std::env::set_var("PORTAL_STATE_DIR", "/tmp/portal-state");
        std::env::set_var("PORTAL_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("PORTAL_CONNECT_TIMEOUT_SECS", "2");
    }

    let cfg = PortalConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "https://pdao.example.test");
    assert_eq!(cfg.state_dir, PathBuf::from("/tmp/portal-state"));
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 5, connect_secs: 2 });

    unsafe { clear_portal_env() };
}

#[test]
fn from_env_bad_timeout_falls_back() {
    let _env = env_lock();
    unsafe {
        clear_portal_env();
        std::env::set_var("PORTAL_REQUEST_TIMEOUT_SECS", "soon");
    }

    let cfg = PortalConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

    unsafe { clear_portal_env() };
}

#[test]
fn from_env_rejects_non_http_base_url() {
    let _env = env_lock();
    unsafe {
        clear_portal_env();
        std::env::set_var("PORTAL_API_BASE_URL", "ftp://files.example.test");
    }

    let err = PortalConfig::from_env().unwrap_err();
    assert_eq!(err, ConfigError::InvalidBaseUrl("ftp://files.example.test".to_owned()));

    unsafe { clear_portal_env() };
}

#[test]
fn with_api_base_url_rejects_missing_host() {
    assert!(PortalConfig::default().with_api_base_url("https://").is_err());
}

#[test]
fn with_api_base_url_trims() {
    let cfg = PortalConfig::default().with_api_base_url(" http://127.0.0.1:8080/ ").unwrap();
    assert_eq!(cfg.api_base_url, "http://127.0.0.1:8080");
}
