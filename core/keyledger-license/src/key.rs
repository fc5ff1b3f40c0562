//! License key records and their redemption state machine.
//!
//! A key moves through three states:
//!
//! | Current   | Guard              | Next      | Outcome       |
//! |-----------|--------------------|-----------|---------------|
//! | `Unused`  | `now <= expires_at`| `Used`    | `Success`     |
//! | `Unused`  | `now > expires_at` | `Expired` | `Expired`     |
//! | `Used`    |                    | `Used`    | `AlreadyUsed` |
//! | `Expired` |                    | `Expired` | `Expired`     |
//!
//! Expiry is only ever detected here, when a redemption is attempted. A key
//! whose window lapses without a redemption attempt stays `Unused` in the
//! registry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LicenseError, LicenseResult};

/// Length of a key's validity window, in whole days. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DurationDays(u32);

impl DurationDays {
    /// Creates a duration, rejecting zero.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidDuration`] if `days` is zero.
    pub fn new(days: u32) -> LicenseResult<Self> {
        if days == 0 {
            return Err(LicenseError::InvalidDuration(
                "duration must be at least one day".to_string(),
            ));
        }
        Ok(Self(days))
    }

    /// Returns the number of days.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Interprets a loosely typed request value as a duration.
    ///
    /// Accepts a positive integral JSON number or a string holding one
    /// (`30`, `30.0`, `"30"`). Anything else, including a missing or null
    /// value, is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidDuration`] describing the rejected input.
    pub fn from_json(value: Option<&Value>) -> LicenseResult<Self> {
        match value {
            None | Some(Value::Null) => Err(LicenseError::InvalidDuration(
                "duration is required".to_string(),
            )),
            Some(Value::Number(n)) => {
                if let Some(days) = n.as_i64() {
                    Self::try_from(days)
                } else if let Some(days) = n.as_u64() {
                    u32::try_from(days)
                        .map_err(|_| out_of_range(days))
                        .and_then(Self::new)
                } else {
                    let days = n.as_f64().unwrap_or(f64::NAN);
                    Self::from_float(days)
                }
            }
            Some(Value::String(s)) => s.trim().parse::<Self>(),
            Some(other) => Err(LicenseError::InvalidDuration(format!(
                "duration must be a number, got {other}"
            ))),
        }
    }

    fn from_float(days: f64) -> LicenseResult<Self> {
        if !days.is_finite() || days.fract() != 0.0 {
            return Err(LicenseError::InvalidDuration(format!(
                "duration must be a whole number of days, got {days}"
            )));
        }
        if days < 1.0 || days > f64::from(u32::MAX) {
            return Err(out_of_range(days));
        }
        Self::new(days as u32)
    }
}

fn out_of_range(days: impl fmt::Display) -> LicenseError {
    LicenseError::InvalidDuration(format!("duration out of range: {days}"))
}

impl TryFrom<i64> for DurationDays {
    type Error = LicenseError;

    fn try_from(days: i64) -> LicenseResult<Self> {
        let days = u32::try_from(days).map_err(|_| out_of_range(days))?;
        Self::new(days)
    }
}

impl TryFrom<u32> for DurationDays {
    type Error = LicenseError;

    fn try_from(days: u32) -> LicenseResult<Self> {
        Self::new(days)
    }
}

impl From<DurationDays> for u32 {
    fn from(days: DurationDays) -> Self {
        days.0
    }
}

impl std::str::FromStr for DurationDays {
    type Err = LicenseError;

    fn from_str(s: &str) -> LicenseResult<Self> {
        if let Ok(days) = s.parse::<i64>() {
            return Self::try_from(days);
        }
        match s.parse::<f64>() {
            Ok(days) => Self::from_float(days),
            Err(_) => Err(LicenseError::InvalidDuration(format!(
                "duration is not a number: {s:?}"
            ))),
        }
    }
}

impl fmt::Display for DurationDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.0)
    }
}

/// Lifecycle state of an issued key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    /// Issued and not yet redeemed.
    Unused,
    /// Redeemed once. Terminal.
    Used,
    /// A redemption was attempted after the window closed. Terminal.
    Expired,
}

impl KeyState {
    /// Returns true if no further transition can happen.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Used | Self::Expired)
    }

    /// Returns the lowercase name used in serialized records.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a redemption attempt against an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Redemption {
    /// The key was unused and inside its window; it is now `Used`.
    Success {
        /// Validity window the key was issued with.
        duration_days: DurationDays,
    },
    /// The key had already been redeemed.
    AlreadyUsed,
    /// The key's window has closed.
    Expired,
}

impl Redemption {
    /// Returns true for [`Redemption::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// An issued license key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseKey {
    token: String,
    duration_days: DurationDays,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    state: KeyState,
}

impl LicenseKey {
    pub(crate) fn new(
        token: String,
        duration_days: DurationDays,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(expires_at > issued_at);
        Self {
            token,
            duration_days,
            issued_at,
            expires_at,
            state: KeyState::Unused,
        }
    }

    /// Returns the key string.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the validity window length.
    #[must_use]
    pub fn duration_days(&self) -> DurationDays {
        self.duration_days
    }

    /// Returns when the key was issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the last instant at which the key can be redeemed.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the stored lifecycle state.
    ///
    /// This is the state as of the last redemption attempt; an unredeemed key
    /// past its window still reports `Unused`.
    #[must_use]
    pub fn state(&self) -> KeyState {
        self.state
    }

    /// Returns true if `now` falls after the validity window.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Applies one redemption attempt at `now`.
    pub(crate) fn redeem(&mut self, now: DateTime<Utc>) -> Redemption {
        match self.state {
            KeyState::Used => Redemption::AlreadyUsed,
            KeyState::Expired => Redemption::Expired,
            KeyState::Unused if self.is_expired_at(now) => {
                self.state = KeyState::Expired;
                Redemption::Expired
            }
            KeyState::Unused => {
                self.state = KeyState::Used;
                Redemption::Success {
                    duration_days: self.duration_days,
                }
            }
        }
    }
}
