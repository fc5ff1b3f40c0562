//! Random key generation.
//!
//! Keys are four groups of four characters from `[A-Z0-9]`, joined by
//! hyphens, with an optional caller prefix:
//!
//! ```text
//! ABCD-1234-EFGH-5678
//! PROMO-ABCD-1234-EFGH-5678
//! ```
//!
//! Every character is an independent uniform draw from a CSPRNG, so the
//! unprefixed part carries 16 * log2(36) ≈ 82.7 bits of entropy.

use chrono::{DateTime, Days, Utc};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{LicenseError, LicenseResult};
use crate::key::DurationDays;

/// Characters a key group is drawn from.
pub const TOKEN_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of hyphen-separated groups in a key.
pub const GROUP_COUNT: usize = 4;

/// Characters per group.
pub const GROUP_LEN: usize = 4;

/// Length of the unprefixed part of a key, separators included.
pub const BODY_LEN: usize = GROUP_COUNT * GROUP_LEN + (GROUP_COUNT - 1);

/// Something that can propose candidate keys.
///
/// The registry calls [`KeySource::generate`] until it gets a token it has
/// not issued before, and records the window that came with that token.
pub trait KeySource: Send {
    /// Produces a candidate token together with its validity window starting
    /// at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidDuration`] if the window would end past
    /// the latest representable date.
    fn generate(
        &mut self,
        duration: DurationDays,
        prefix: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<GeneratedKey>;
}

/// A freshly generated key, not yet recorded anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    /// The key string.
    pub token: String,
    /// Start of the validity window.
    pub issued_at: DateTime<Utc>,
    /// End of the validity window.
    pub expires_at: DateTime<Utc>,
}

/// Generates random license keys.
#[derive(Debug)]
pub struct KeyGenerator {
    rng: StdRng,
    alphabet: Uniform<usize>,
}

impl KeyGenerator {
    /// Creates a generator seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a deterministic generator.
    ///
    /// Output is fully predictable from `seed`; never use this for real keys.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            alphabet: Uniform::new(0, TOKEN_ALPHABET.len()),
        }
    }

    /// Produces a random token, prefixed with `prefix-` when a non-empty
    /// prefix is given.
    pub fn generate_token(&mut self, prefix: Option<&str>) -> String {
        let prefix = prefix.filter(|p| !p.is_empty());
        let mut token = String::with_capacity(prefix.map_or(0, |p| p.len() + 1) + BODY_LEN);

        if let Some(prefix) = prefix {
            token.push_str(prefix);
            token.push('-');
        }
        for group in 0..GROUP_COUNT {
            if group > 0 {
                token.push('-');
            }
            for _ in 0..GROUP_LEN {
                let idx = self.alphabet.sample(&mut self.rng);
                token.push(char::from(TOKEN_ALPHABET[idx]));
            }
        }
        token
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for KeyGenerator {
    fn generate(
        &mut self,
        duration: DurationDays,
        prefix: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<GeneratedKey> {
        let expires_at = validity_window(now, duration)?;
        Ok(GeneratedKey {
            token: self.generate_token(prefix),
            issued_at: now,
            expires_at,
        })
    }
}

/// Computes the end of a window of `duration` calendar days from `issued_at`.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidDuration`] on date overflow.
pub fn validity_window(
    issued_at: DateTime<Utc>,
    duration: DurationDays,
) -> LicenseResult<DateTime<Utc>> {
    issued_at
        .checked_add_days(Days::new(u64::from(duration.get())))
        .ok_or_else(|| {
            LicenseError::InvalidDuration(format!("{duration} overflows the calendar"))
        })
}

/// Returns true if `token` has the `(PREFIX-)?XXXX-XXXX-XXXX-XXXX` shape.
///
/// The prefix itself is not checked beyond being non-empty.
#[must_use]
pub fn is_well_formed(token: &str) -> bool {
    let Some(split) = token.len().checked_sub(BODY_LEN) else {
        return false;
    };
    let Some(body) = token.get(split..) else {
        return false;
    };
    if split > 0 {
        // Needs at least one prefix character before the separator.
        if split < 2 || !token[..split].ends_with('-') {
            return false;
        }
    }

    let groups: Vec<&str> = body.split('-').collect();
    groups.len() == GROUP_COUNT
        && groups.iter().all(|g| {
            g.len() == GROUP_LEN && g.bytes().all(|b| TOKEN_ALPHABET.contains(&b))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_generators_agree() {
        let mut a = KeyGenerator::from_seed(42);
        let mut b = KeyGenerator::from_seed(42);
        assert_eq!(a.generate_token(None), b.generate_token(None));
    }

    #[test]
    fn empty_prefix_is_ignored() {
        let mut g = KeyGenerator::from_seed(1);
        let token = g.generate_token(Some(""));
        assert_eq!(token.len(), BODY_LEN);
        assert!(is_well_formed(&token));
    }

    #[test]
    fn well_formed_rejects_bad_shapes() {
        assert!(is_well_formed("ABCD-1234-EFGH-5678"));
        assert!(is_well_formed("PROMO-ABCD-1234-EFGH-5678"));
        assert!(is_well_formed("A-B-ABCD-1234-EFGH-5678"));
        assert!(!is_well_formed("-ABCD-1234-EFGH-5678"));
        assert!(!is_well_formed("PROMOABCD-1234-EFGH-5678"));
        assert!(!is_well_formed("abcd-1234-EFGH-5678"));
        assert!(!is_well_formed("ABCD-1234-EFGH"));
        assert!(!is_well_formed("ABCD12345-EFGH-5678"));
        assert!(!is_well_formed(""));
    }
}
