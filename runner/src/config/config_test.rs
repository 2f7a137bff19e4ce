use super::AggregateConfig;
use dpubench_analysis::CheckAction;
use dpubench_ingest::FailurePolicy;
use std::path::PathBuf;

#[test]
pub fn empty_config_uses_defaults() {
    let mut config = AggregateConfig::from_yaml("{}").unwrap();

    assert_eq!(config.benchmarks.len(), 15);
    assert_eq!(config.benchmarks[0], "BS");
    assert_eq!(config.store.path, PathBuf::from("aggregate.json"));
    assert_eq!(config.check.output, PathBuf::from("checked.json"));
    assert_eq!(config.profile.failures, FailurePolicy::Abort);
    assert_eq!(config.check.default, CheckAction::Decrease { threshold: 0.15 });
    assert_eq!(config.check.rules.len(), 1);
    assert!(!config.preflight_checks());
}

#[test]
pub fn full_config() {
    let yaml = "
benchmarks: [BS, VA]
root: /data/prim
profile:
  glob: 'out_*'
  failures: skip
store:
  path: history.json
plot:
  output: plots
check:
  default:
    kind: decrease
    threshold: 0.1
  rules:
    - benchmark: VA
      action:
        kind: ignore
";

    let mut config = AggregateConfig::from_yaml(yaml).unwrap();

    assert!(!config.preflight_checks());
    assert_eq!(config.benchmarks, vec!["BS", "VA"]);
    assert_eq!(config.root, PathBuf::from("/data/prim"));
    assert_eq!(config.profile.failures, FailurePolicy::Skip);
    assert!(config
        .profile
        .glob
        .as_ref()
        .unwrap()
        .compile_matcher()
        .is_match("out_tl1_bl1_dpus1"));
    assert_eq!(config.store.path, PathBuf::from("history.json"));
    assert_eq!(config.plot.output, PathBuf::from("plots"));
    assert_eq!(config.plot.cell_width, 500);
    assert_eq!(config.check.rules[0].benchmark.as_deref(), Some("VA"));
}

#[test]
pub fn unknown_fields_are_rejected() {
    assert!(AggregateConfig::from_yaml("benchmark: [BS]").is_err());
}

#[test]
pub fn preflight_flags_bad_benchmarks() {
    let mut config = AggregateConfig::from_yaml("benchmarks: ['A:B']").unwrap();
    assert!(config.preflight_checks());

    let mut config = AggregateConfig::from_yaml("benchmarks: []").unwrap();
    assert!(config.preflight_checks());

    let mut config =
        AggregateConfig::from_yaml("check: {default: {kind: decrease, threshold: 1.5}}").unwrap();
    assert!(config.preflight_checks());
}

#[test]
pub fn preflight_deduplicates_benchmarks() {
    let mut config = AggregateConfig::from_yaml("benchmarks: [BS, VA, BS]").unwrap();

    assert!(!config.preflight_checks());
    assert_eq!(config.benchmarks, vec!["BS", "VA"]);
}
