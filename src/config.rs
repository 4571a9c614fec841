// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Engine tuning knobs.
//!
//! Values come from defaults, optionally overridden by `TWINVIEW_*` environment variables.
//! Unparseable values fall back to the default; parsed values are clamped to sane ranges.

use std::time::Duration;

use crate::query::DEFAULT_THRESHOLD;

pub const ENV_CACHE_CAPACITY: &str = "TWINVIEW_CACHE_CAPACITY";
pub const ENV_CACHE_TTL_SECS: &str = "TWINVIEW_CACHE_TTL_SECS";
pub const ENV_RENDER_TIMEOUT_SECS: &str = "TWINVIEW_RENDER_TIMEOUT_SECS";
pub const ENV_SEARCH_THRESHOLD: &str = "TWINVIEW_SEARCH_THRESHOLD";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Maximum number of rendered diagrams kept.
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub render_timeout: Duration,
    /// Minimum similarity (0..=1) for a search field to match.
    pub search_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 100,
            cache_ttl: Duration::from_secs(10 * 60),
            render_timeout: Duration::from_secs(30),
            search_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).map(|raw| raw.trim().to_owned());

        let cache_capacity = parsed(ENV_CACHE_CAPACITY)
            .and_then(|raw| raw.parse::<usize>().ok())
            .map_or(defaults.cache_capacity, |value| value.clamp(1, 100_000));
        let cache_ttl = parsed(ENV_CACHE_TTL_SECS)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map_or(defaults.cache_ttl, |secs| {
                Duration::from_secs(secs.clamp(1, 7 * 24 * 60 * 60))
            });
        let render_timeout = parsed(ENV_RENDER_TIMEOUT_SECS)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map_or(defaults.render_timeout, |secs| {
                Duration::from_secs(secs.clamp(1, 600))
            });
        let search_threshold = parsed(ENV_SEARCH_THRESHOLD)
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .map_or(defaults.search_threshold, |value| value.clamp(0.0, 1.0));

        Self {
            cache_capacity,
            cache_ttl,
            render_timeout,
            search_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{
        EngineConfig, ENV_CACHE_CAPACITY, ENV_CACHE_TTL_SECS, ENV_RENDER_TIMEOUT_SECS,
        ENV_SEARCH_THRESHOLD,
    };

    fn config(vars: &[(&str, &str)]) -> EngineConfig {
        let vars = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>();
        EngineConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_overrides() {
        let config = config(&[]);
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.render_timeout, Duration::from_secs(30));
        assert!((config.search_threshold - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn overrides_are_trimmed_and_clamped() {
        let config = config(&[
            (ENV_CACHE_CAPACITY, " 0 "),
            (ENV_CACHE_TTL_SECS, "90"),
            (ENV_RENDER_TIMEOUT_SECS, "100000"),
            (ENV_SEARCH_THRESHOLD, "1.5"),
        ]);
        assert_eq!(config.cache_capacity, 1);
        assert_eq!(config.cache_ttl, Duration::from_secs(90));
        assert_eq!(config.render_timeout, Duration::from_secs(600));
        assert!((config.search_threshold - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let config = config(&[(ENV_CACHE_CAPACITY, "lots"), (ENV_SEARCH_THRESHOLD, "NaN")]);
        assert_eq!(config, EngineConfig::default());
    }
}
