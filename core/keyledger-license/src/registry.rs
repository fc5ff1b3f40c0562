//! The authoritative store of issued keys.
//!
//! One mutex guards both the token map and the key source, so the
//! uniqueness check in [`KeyRegistry::issue`] and the read-check-write in
//! [`KeyRegistry::redeem`] each happen under a single acquisition. Two
//! concurrent redemptions of the same token are serialized and only the
//! first can observe `Unused`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{LicenseError, LicenseResult};
use crate::generator::{GeneratedKey, KeyGenerator, KeySource};
use crate::key::{DurationDays, LicenseKey, Redemption};

struct Inner {
    keys: HashMap<String, LicenseKey>,
    source: Box<dyn KeySource>,
}

/// Issues keys and arbitrates their redemption.
pub struct KeyRegistry {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl KeyRegistry {
    /// Creates an empty registry using OS randomness and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(KeyGenerator::new(), Arc::new(SystemClock))
    }

    /// Creates an empty registry reading time from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(KeyGenerator::new(), clock)
    }

    /// Creates an empty registry from an explicit key source and clock.
    #[must_use]
    pub fn with_parts(source: impl KeySource + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                keys: HashMap::new(),
                source: Box::new(source),
            }),
            clock,
        }
    }

    // Every mutation under this lock is a single insert or state assignment,
    // so a panic elsewhere cannot leave a record half-written.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues a new `Unused` key valid for `duration` days from now.
    ///
    /// Candidate tokens that collide with an already issued key are discarded
    /// and a new one is drawn; an existing key is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidDuration`] if the window end is not a
    /// representable date.
    pub fn issue(&self, duration: DurationDays, prefix: Option<&str>) -> LicenseResult<LicenseKey> {
        let mut inner = self.lock();
        let now = self.clock.now();

        let generated = loop {
            let candidate = inner.source.generate(duration, prefix, now)?;
            if !inner.keys.contains_key(&candidate.token) {
                break candidate;
            }
            warn!("generated key collides with an issued key, regenerating");
        };

        let GeneratedKey {
            token,
            issued_at,
            expires_at,
        } = generated;
        let key = LicenseKey::new(token.clone(), duration, issued_at, expires_at);
        inner.keys.insert(token, key.clone());
        info!(key = key.token(), %duration, expires_at = %expires_at, "generated and stored new key");
        Ok(key)
    }

    /// Attempts to redeem `token`, moving it to `Used` or `Expired` as the
    /// lifecycle dictates.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::KeyNotFound`] if `token` was never issued.
    pub fn redeem(&self, token: &str) -> LicenseResult<Redemption> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let key = inner.keys.get_mut(token).ok_or(LicenseError::KeyNotFound)?;

        let outcome = key.redeem(now);
        match outcome {
            Redemption::Success { .. } => info!(key = token, "key marked as used"),
            Redemption::AlreadyUsed => debug!(key = token, "key already used"),
            Redemption::Expired => debug!(key = token, expired_at = %key.expires_at(), "key expired"),
        }
        Ok(outcome)
    }

    /// Returns a snapshot of the record for `token`, if issued.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<LicenseKey> {
        self.lock().keys.get(token).cloned()
    }

    /// Returns how many keys have been issued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().keys.len()
    }

    /// Returns true if no key has been issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().keys.is_empty()
    }
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRegistry")
            .field("keys", &self.len())
            .finish_non_exhaustive()
    }
}
