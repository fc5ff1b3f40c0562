//! Shared test helpers for registry tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use keyledger_license::{
    validity_window, DurationDays, GeneratedKey, KeyRegistry, KeySource, LicenseResult,
    ManualClock,
};

/// A fixed, arbitrary instant to start manual clocks from.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
}

/// Shorthand for a known-good duration.
pub fn days(n: u32) -> DurationDays {
    DurationDays::new(n).unwrap()
}

/// Returns a registry backed by a manual clock, plus a handle to that clock.
pub fn registry_with_clock() -> (KeyRegistry, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(epoch()));
    let registry = KeyRegistry::with_clock(clock.clone());
    (registry, clock)
}

/// A key source that replays a fixed script, then panics if asked for more.
///
/// Each entry may pin its own window end; otherwise the window is computed
/// from the requested duration like the real generator does.
pub struct ScriptedSource {
    entries: VecDeque<(String, Option<DateTime<Utc>>)>,
}

impl ScriptedSource {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: tokens.into_iter().map(|t| (t.into(), None)).collect(),
        }
    }

    /// Script entries that each carry their own expiry.
    pub fn with_expiries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, DateTime<Utc>)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(t, expires_at)| (t.into(), Some(expires_at)))
                .collect(),
        }
    }
}

impl KeySource for ScriptedSource {
    fn generate(
        &mut self,
        duration: DurationDays,
        prefix: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<GeneratedKey> {
        let (body, expires_at) = self.entries.pop_front().expect("scripted source exhausted");
        let token = match prefix.filter(|p| !p.is_empty()) {
            Some(p) => format!("{p}-{body}"),
            None => body,
        };
        let expires_at = match expires_at {
            Some(at) => at,
            None => validity_window(now, duration)?,
        };
        Ok(GeneratedKey {
            token,
            issued_at: now,
            expires_at,
        })
    }
}
