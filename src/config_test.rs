use super::*;

// =============================================================================
// env_parse / env_bool: unique keys avoid races with parallel tests.
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: u64 = env_parse("__SB_TEST_MISSING_4411__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_trims_and_parses() {
    unsafe { std::env::set_var("__SB_TEST_PARSE_4412__", " 99 ") };
    let val: usize = env_parse("__SB_TEST_PARSE_4412__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__SB_TEST_PARSE_4412__") };
}

#[test]
fn env_parse_invalid_returns_default() {
    unsafe { std::env::set_var("__SB_TEST_INVALID_4413__", "sixty") };
    let val: u64 = env_parse("__SB_TEST_INVALID_4413__", 60);
    assert_eq!(val, 60);
    unsafe { std::env::remove_var("__SB_TEST_INVALID_4413__") };
}

#[test]
fn env_bool_accepts_common_spellings() {
    for (i, (raw, expected)) in [("1", true), ("Yes", true), ("on", true), ("0", false), ("OFF", false)]
        .iter()
        .enumerate()
    {
        let key = format!("__SB_TEST_BOOL_{i}__");
        unsafe { std::env::set_var(&key, raw) };
        assert_eq!(env_bool(&key), Some(*expected), "{raw:?}");
        unsafe { std::env::remove_var(&key) };
    }
    assert_eq!(env_bool("__SB_TEST_BOOL_UNSET__"), None);
}

// =============================================================================
// AppConfig
// =============================================================================

#[test]
fn for_database_uses_documented_defaults() {
    let config = AppConfig::for_database("postgres://x");
    assert_eq!(config.port, 3000);
    assert_eq!(config.overdue_scan_interval_secs, 60);
    assert_eq!(config.overdue_scan_batch_size, 100);
    assert_eq!(config.avatar.size_px, 256);
    assert_eq!(config.avatar.max_bytes, 5 * 1024 * 1024);
    assert_eq!(config.session_ttl_days, 30);
    assert!(config.google.is_none());
}

#[test]
fn storage_paths_hang_off_storage_dir() {
    let mut config = AppConfig::for_database("postgres://x");
    config.storage_dir = PathBuf::from("/srv/sb");
    assert_eq!(config.tmp_dir(), PathBuf::from("/srv/sb/tmp"));
    assert_eq!(config.public_dir(), PathBuf::from("/srv/sb/public"));
    assert_eq!(config.avatar_dir(), PathBuf::from("/srv/sb/public/avatars"));
}
