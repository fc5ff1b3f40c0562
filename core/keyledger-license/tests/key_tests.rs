mod common;

use common::{days, epoch, registry_with_clock};
use keyledger_license::{DurationDays, KeyState, LicenseError, Redemption};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── DurationDays ─────────────────────────────────────────────────

#[test]
fn duration_rejects_zero() {
    assert!(matches!(
        DurationDays::new(0),
        Err(LicenseError::InvalidDuration(_))
    ));
}

#[test]
fn duration_from_json_number() {
    let d = DurationDays::from_json(Some(&json!(30))).unwrap();
    assert_eq!(d.get(), 30);
}

#[test]
fn duration_from_json_whole_float() {
    let d = DurationDays::from_json(Some(&json!(7.0))).unwrap();
    assert_eq!(d.get(), 7);
}

#[test]
fn duration_from_json_numeric_string() {
    let d = DurationDays::from_json(Some(&json!(" 90 "))).unwrap();
    assert_eq!(d.get(), 90);
}

#[test]
fn duration_from_json_rejects_missing_and_null() {
    assert!(DurationDays::from_json(None).is_err());
    assert!(DurationDays::from_json(Some(&json!(null))).is_err());
}

#[test]
fn duration_from_json_rejects_garbage() {
    let rejected = [
        json!(0),
        json!(-3),
        json!(1.5),
        json!("abc"),
        json!(""),
        json!("-1"),
        json!(true),
        json!([30]),
        json!({"days": 30}),
        json!(u64::MAX),
    ];
    for value in rejected {
        let result = DurationDays::from_json(Some(&value));
        assert!(
            matches!(result, Err(LicenseError::InvalidDuration(_))),
            "{value} should be rejected, got {result:?}"
        );
    }
}

#[test]
fn duration_parse_str() {
    assert_eq!("12".parse::<DurationDays>().unwrap().get(), 12);
    assert!("twelve".parse::<DurationDays>().is_err());
}

#[test]
fn duration_serde_is_a_plain_number() {
    assert_eq!(serde_json::to_string(&days(30)).unwrap(), "30");
    let parsed: DurationDays = serde_json::from_str("30").unwrap();
    assert_eq!(parsed, days(30));
    assert!(serde_json::from_str::<DurationDays>("0").is_err());
}

// ── KeyState ─────────────────────────────────────────────────────

#[test]
fn state_terminality() {
    assert!(!KeyState::Unused.is_terminal());
    assert!(KeyState::Used.is_terminal());
    assert!(KeyState::Expired.is_terminal());
}

#[test]
fn state_serde_lowercase() {
    assert_eq!(serde_json::to_string(&KeyState::Unused).unwrap(), r#""unused""#);
    assert_eq!(serde_json::to_string(&KeyState::Used).unwrap(), r#""used""#);
    assert_eq!(serde_json::to_string(&KeyState::Expired).unwrap(), r#""expired""#);
    assert_eq!(KeyState::Used.to_string(), "used");
}

// ── LicenseKey ───────────────────────────────────────────────────

#[test]
fn issued_key_fields() {
    let (registry, _) = registry_with_clock();
    let key = registry.issue(days(30), Some("PROMO")).unwrap();

    assert!(key.token().starts_with("PROMO-"));
    assert_eq!(key.duration_days(), days(30));
    assert_eq!(key.issued_at(), epoch());
    assert_eq!(key.expires_at() - key.issued_at(), chrono::Duration::days(30));
    assert_eq!(key.state(), KeyState::Unused);
}

#[test]
fn is_expired_at_boundary() {
    let (registry, _) = registry_with_clock();
    let key = registry.issue(days(1), None).unwrap();

    assert!(!key.is_expired_at(key.expires_at()));
    assert!(key.is_expired_at(key.expires_at() + chrono::Duration::milliseconds(1)));
}

#[test]
fn license_key_serde_roundtrip() {
    let (registry, _) = registry_with_clock();
    let key = registry.issue(days(5), None).unwrap();

    let json = serde_json::to_value(&key).unwrap();
    assert_eq!(json["state"], "unused");
    assert_eq!(json["duration_days"], 5);

    let parsed: keyledger_license::LicenseKey = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, key);
}

#[test]
fn redemption_serde_tags_outcome() {
    let json = serde_json::to_value(Redemption::Success { duration_days: days(3) }).unwrap();
    assert_eq!(json, json!({"outcome": "success", "duration_days": 3}));
    let json = serde_json::to_value(Redemption::AlreadyUsed).unwrap();
    assert_eq!(json, json!({"outcome": "already_used"}));
}
