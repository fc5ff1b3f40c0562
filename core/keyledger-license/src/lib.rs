//! License key issuance and single-use redemption.
//!
//! This crate handles:
//! - Generating random, human-transcribable keys (`XXXX-XXXX-XXXX-XXXX`)
//! - Recording each key with a validity window measured in days
//! - Redeeming a key at most once, and never after its window closes
//!
//! # Design Principles
//!
//! - **Single authority**: one [`KeyRegistry`] answers whether a key has been
//!   consumed, and concurrent redemptions of the same key cannot both succeed
//! - **Lazy expiry**: a key's window is checked when it is redeemed; nothing
//!   sweeps the registry in the background
//! - **No overwrite**: a generated token that collides with an issued one is
//!   discarded and regenerated
//! - **Transport-free**: no HTTP, no persistence; callers inject the registry
//!   wherever they need it

mod clock;
mod error;
mod generator;
mod key;
mod registry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LicenseError, LicenseResult};
pub use generator::{
    is_well_formed, validity_window, GeneratedKey, KeyGenerator, KeySource, BODY_LEN,
    GROUP_COUNT, GROUP_LEN, TOKEN_ALPHABET,
};
pub use key::{DurationDays, KeyState, LicenseKey, Redemption};
pub use registry::KeyRegistry;
