// tests/settings_bounds.rs
use serial_test::serial;

use techstan_news_monitor::settings::{Settings, SettingsError, SettingsUpdate};
use techstan_news_monitor::AppConfig;

#[test]
fn out_of_range_interval_is_rejected_before_write() {
    let s = Settings::in_memory(&AppConfig::default());
    let before = s.view();
    assert!(matches!(
        s.save(SettingsUpdate { check_interval: Some(3) }),
        Err(SettingsError::OutOfRange { .. })
    ));
    assert_eq!(s.view(), before);
}

#[test]
fn saved_interval_is_reflected_on_read() {
    let s = Settings::in_memory(&AppConfig::default());
    let saved = s.save(SettingsUpdate { check_interval: Some(30) }).unwrap();
    assert_eq!(saved.check_interval, 30);
    assert_eq!(s.view().check_interval, 30);
}

#[test]
#[serial]
fn env_interval_seeds_settings_default() {
    std::env::set_var("CHECK_INTERVAL", "120");
    let cfg = AppConfig::from_env();
    std::env::remove_var("CHECK_INTERVAL");
    assert_eq!(Settings::in_memory(&cfg).check_interval(), 120);
}
