use crate::config::{BASE_DELAY, SimConfig};
use crate::error::Error;
use crate::sim::SimTime;

#[test]
fn default_config_uses_base_delay() {
    let cfg = SimConfig::default();
    assert_eq!(cfg.delay_factor(), 1);
    assert_eq!(cfg.rtt_factor(), 1);
    assert_eq!(cfg.link_delay(), BASE_DELAY);
    assert_eq!(BASE_DELAY, SimTime::from_millis(50));
}

#[test]
fn factors_outside_their_range_are_rejected() {
    for (d, r) in [(0, 1), (101, 1), (1, 0), (1, 6)] {
        let err = SimConfig::new(d, r).expect_err("out of range");
        assert!(matches!(err, Error::InvalidConfig(_)), "({d}, {r})");
    }
    assert!(SimConfig::new(100, 5).is_ok());
}

#[test]
fn link_delay_is_the_product_of_both_factors() {
    let cfg = SimConfig::new(10, 4).expect("cfg");
    assert_eq!(cfg.link_delay(), SimTime::from_millis(2_000));

    let cfg = cfg.with_rtt_factor(1).expect("rtt");
    assert_eq!(cfg.link_delay(), SimTime::from_millis(500));
    assert!(cfg.with_delay_factor(0).is_err());
}

#[test]
fn config_deserializes_with_defaults_and_validation() {
    let cfg: SimConfig = serde_json::from_str(r#"{ "rtt_factor": 2 }"#).expect("parse");
    assert_eq!(cfg, SimConfig::new(1, 2).expect("cfg"));

    assert!(serde_json::from_str::<SimConfig>(r#"{ "delay_factor": 500 }"#).is_err());

    let json = serde_json::to_string(&cfg).expect("serialize");
    assert_eq!(json, r#"{"delay_factor":1,"rtt_factor":2}"#);
}
