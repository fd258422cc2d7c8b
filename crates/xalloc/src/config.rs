//! Runtime configuration, read from the environment when the global
//! allocator is first used.

use std::env;

const POISON_VAR: &str = "XALLOC_POISON";
const FAIL_AFTER_VAR: &str = "XALLOC_FAIL_AFTER";

/// Knobs for an [`Xalloc`](crate::Xalloc) instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Fill user bytes with [`POISON_BYTE`](crate::hardening::poison::POISON_BYTE)
    /// before a block is handed back to the system allocator.
    pub poison_released: bool,

    /// Fault injection: after this many successful system-allocator requests,
    /// every further reserve/resize is reported as exhaustion.
    pub fail_after: Option<u64>,
}

impl Config {
    /// Build a config from `XALLOC_POISON` and `XALLOC_FAIL_AFTER`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(val) = lookup(POISON_VAR) {
            match parse_flag(&val) {
                Some(on) => config.poison_released = on,
                None => log::warn!("ignoring {POISON_VAR}={val:?}: expected 0/1/true/false"),
            }
        }

        if let Some(val) = lookup(FAIL_AFTER_VAR) {
            match val.trim().parse::<u64>() {
                Ok(n) => config.fail_after = Some(n),
                Err(_) => log::warn!("ignoring {FAIL_AFTER_VAR}={val:?}: expected a request count"),
            }
        }

        config
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_with(&[]), Config::default());
    }

    #[test]
    fn reads_poison_flag() {
        assert!(config_with(&[(POISON_VAR, "1")]).poison_released);
        assert!(config_with(&[(POISON_VAR, "TRUE")]).poison_released);
        assert!(!config_with(&[(POISON_VAR, "off")]).poison_released);
    }

    #[test]
    fn reads_fail_after() {
        assert_eq!(config_with(&[(FAIL_AFTER_VAR, "0")]).fail_after, Some(0));
        assert_eq!(config_with(&[(FAIL_AFTER_VAR, " 12 ")]).fail_after, Some(12));
    }

    #[test]
    fn invalid_values_are_ignored() {
        let config = config_with(&[(POISON_VAR, "maybe"), (FAIL_AFTER_VAR, "-3")]);
        assert_eq!(config, Config::default());
    }
}
