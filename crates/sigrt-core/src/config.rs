use crate::declaration::CheckedLevel;
use std::sync::OnceLock;

pub const CHECKED_ENV: &str = "SIGRT_CHECKED";
pub const TEST_MODE_ENV: &str = "SIGRT_TEST_MODE";

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str) -> bool {
    env_true(key).unwrap_or(false)
}

/// Whether `CheckedLevel::Tests` declarations are enforced.
pub fn test_mode() -> bool {
    static TEST_MODE: OnceLock<bool> = OnceLock::new();
    *TEST_MODE.get_or_init(|| bool_from_env(TEST_MODE_ENV))
}

/// Level applied to declarations that don't pick one themselves.
pub fn default_checked_level() -> CheckedLevel {
    static CHECKED: OnceLock<CheckedLevel> = OnceLock::new();
    *CHECKED.get_or_init(|| match std::env::var(CHECKED_ENV) {
        Ok(raw) => CheckedLevel::parse(&raw).unwrap_or_else(|| {
            warn!("ignoring {}={:?}: expected always, tests or never", CHECKED_ENV, raw);
            CheckedLevel::Always
        }),
        Err(_) => CheckedLevel::Always,
    })
}
