// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared Criterion setup for the view-engine benches.
//!
//! `TWINVIEW_BENCH_SAMPLES`, `TWINVIEW_BENCH_WARMUP_SECS` and `TWINVIEW_BENCH_MEASURE_SECS`
//! tune the run. `TWINVIEW_BENCH_QUICK=1` drops to the smallest settings for smoke runs.
//! Flamegraphs are only collected when `TWINVIEW_PROFILE_FREQ` names a sampling rate in Hz.

use std::time::Duration;

use criterion::Criterion;

use pprof::criterion::{Output, PProfProfiler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BenchSettings {
    samples: usize,
    warm_up: Duration,
    measurement: Duration,
    profile_freq: Option<i32>,
}

impl BenchSettings {
    const QUICK: Self = Self {
        samples: 10,
        warm_up: Duration::from_secs(1),
        measurement: Duration::from_secs(1),
        profile_freq: None,
    };

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |name: &str| lookup(name).and_then(|raw| raw.trim().parse::<u64>().ok());

        let profile_freq = number("TWINVIEW_PROFILE_FREQ")
            .filter(|hz| *hz > 0)
            .map(|hz| hz.min(1000) as i32);

        if lookup("TWINVIEW_BENCH_QUICK").is_some_and(|raw| raw.trim() == "1") {
            return Self {
                profile_freq,
                ..Self::QUICK
            };
        }

        Self {
            samples: number("TWINVIEW_BENCH_SAMPLES").map_or(50, |n| n.clamp(10, 200) as usize),
            warm_up: Duration::from_secs(
                number("TWINVIEW_BENCH_WARMUP_SECS").map_or(2, |secs| secs.clamp(1, 60)),
            ),
            measurement: Duration::from_secs(
                number("TWINVIEW_BENCH_MEASURE_SECS").map_or(4, |secs| secs.clamp(1, 120)),
            ),
            profile_freq,
        }
    }
}

pub fn criterion() -> Criterion {
    let settings = BenchSettings::from_lookup(|name| std::env::var(name).ok());

    let config = Criterion::default()
        .sample_size(settings.samples)
        .warm_up_time(settings.warm_up)
        .measurement_time(settings.measurement);

    match settings.profile_freq {
        Some(hz) => config.with_profiler(PProfProfiler::new(hz, Output::Flamegraph(None))),
        None => config,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::BenchSettings;

    fn settings(vars: &[(&str, &str)]) -> BenchSettings {
        let vars = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>();
        BenchSettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_skip_profiling() {
        let settings = settings(&[]);
        assert_eq!(settings.samples, 50);
        assert_eq!(settings.measurement, Duration::from_secs(4));
        assert_eq!(settings.profile_freq, None);
    }

    #[test]
    fn values_are_clamped_and_quick_keeps_profiling() {
        let clamped = settings(&[
            ("TWINVIEW_BENCH_SAMPLES", "5000"),
            ("TWINVIEW_PROFILE_FREQ", "99999"),
        ]);
        assert_eq!(clamped.samples, 200);
        assert_eq!(clamped.profile_freq, Some(1000));

        let quick = settings(&[("TWINVIEW_BENCH_QUICK", "1"), ("TWINVIEW_PROFILE_FREQ", "250")]);
        assert_eq!(quick.samples, 10);
        assert_eq!(quick.profile_freq, Some(250));
    }
}
