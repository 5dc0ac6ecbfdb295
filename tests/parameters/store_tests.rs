//! Integration tests for the ParameterStore
//!
//! These tests exercise the load/read/edit/serialize surface the way an
//! editing front end drives it.

use crate::test_helpers::{approx_eq, path, PLANT, SCENARIO};
use paramtree::{EngineConfig, ErrorKind, ParamError, ParameterStore, SerializationError};
use serde_json::Value;

fn json(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_concrete_scenario() {
    let mut store = ParameterStore::from_json(SCENARIO).unwrap();
    let a = path("Env", "Temp", "A");
    let b = path("Env", "Temp", "B");

    assert_eq!(store.get_effective_value(&a).unwrap(), 10.0);
    assert_eq!(store.get_effective_value(&b).unwrap(), 20.0);

    store.set_literal(&a, 15.0).unwrap();
    assert_eq!(store.get_effective_value(&b).unwrap(), 30.0);
}

#[test]
fn test_ad_hoc_expressions() {
    let store = ParameterStore::from_json(SCENARIO).unwrap();

    assert_eq!(
        store.evaluate_expression("10 / (5 - 5)").unwrap_err(),
        ParamError::DivisionByZero
    );

    match store.evaluate_expression("Env##Temp##A +") {
        Err(ParamError::Syntax { offset, .. }) => assert_eq!(offset, 13),
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_round_trip_text() {
    let expected = r#"{
  "Env": {
    "Temp": {
      "A": {
        "value": 10,
        "lower": 0,
        "upper": 100,
        "unit": 1,
        "help": ""
      },
      "B": {
        "expr": "Env##Temp##A * 2"
      }
    }
  }
}"#;
    let store = ParameterStore::from_json(expected).unwrap();
    // Computed values must not leak into the output
    store.get_effective_value(&path("Env", "Temp", "B")).unwrap();

    assert_eq!(store.serialize().unwrap(), expected);
}

#[test]
fn test_round_trip_mixed_numbers() {
    let store = ParameterStore::from_json(PLANT).unwrap();
    store.evaluate_all();

    let first = store.serialize().unwrap();
    assert_eq!(json(&first), json(PLANT));

    let reloaded = ParameterStore::from_json(&first).unwrap();
    assert_eq!(reloaded.serialize().unwrap(), first);
}

#[test]
fn test_edits_show_up_in_serialized_form() {
    let mut store = ParameterStore::from_json(SCENARIO).unwrap();
    store.set_literal(&path("Env", "Temp", "A"), 12.25).unwrap();

    let value = json(&store.serialize().unwrap());
    assert_eq!(value["Env"]["Temp"]["A"]["value"], 12.25);
    assert_eq!(value["Env"]["Temp"]["B"], json(r#"{"expr":"Env##Temp##A * 2"}"#));
}

#[test]
fn test_cycles_fail_cleanly() {
    let store = ParameterStore::from_json(
        r#"{"Loop":{"Direct":{
            "A":{"expr":"Loop##Direct##A + 1"}
        },"Indirect":{
            "A":{"expr":"Loop##Indirect##B * 2"},
            "B":{"expr":"Loop##Indirect##C - 1"},
            "C":{"expr":"Loop##Indirect##A"}
        }}}"#,
    )
    .unwrap();

    for p in [
        path("Loop", "Direct", "A"),
        path("Loop", "Indirect", "A"),
        path("Loop", "Indirect", "B"),
        path("Loop", "Indirect", "C"),
    ] {
        let err = store.get_effective_value(&p).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CycleDetected, "{}", p);
    }

    // The error names the loop it found
    match store.get_effective_value(&path("Loop", "Indirect", "A")) {
        Err(ParamError::CycleDetected { chain, .. }) => {
            assert_eq!(chain.first(), chain.last());
            assert_eq!(chain.len(), 4);
        }
        other => panic!("Expected cycle, got {:?}", other),
    }
}

/// Literal `L0` followed by `links` derived parameters, each one more than the last
fn chain_snapshot(links: usize) -> String {
    let mut items = vec![r#""L0":{"value":1,"lower":0,"upper":10,"unit":1}"#.to_string()];
    for i in 1..=links {
        items.push(format!(r#""L{}":{{"expr":"Chain##Links##L{} + 1"}}"#, i, i - 1));
    }
    format!(r#"{{"Chain":{{"Links":{{{}}}}}}}"#, items.join(","))
}

#[test]
fn test_long_chain_hits_depth_cap() {
    let snapshot = chain_snapshot(100);

    let store = ParameterStore::from_json(&snapshot).unwrap();
    assert_eq!(store.get_effective_value(&path("Chain", "Links", "L50")).unwrap(), 51.0);
    assert_eq!(
        store
            .get_effective_value(&path("Chain", "Links", "L100"))
            .unwrap_err()
            .kind(),
        ErrorKind::DepthExceeded
    );

    let mut deep = ParameterStore::with_config(EngineConfig::default().with_max_depth(128));
    deep.load(&snapshot).unwrap();
    assert_eq!(deep.get_effective_value(&path("Chain", "Links", "L100")).unwrap(), 101.0);
}

#[test]
fn test_depth_cap_ignores_read_history() {
    let snapshot = chain_snapshot(100);
    let top = path("Chain", "Links", "L100");

    let cold = ParameterStore::from_json(&snapshot).unwrap();
    let cold_result = cold.get_effective_value(&top);

    let warm = ParameterStore::from_json(&snapshot).unwrap();
    assert_eq!(warm.get_effective_value(&path("Chain", "Links", "L50")).unwrap(), 51.0);
    let warm_result = warm.get_effective_value(&top);

    let mut uncached = ParameterStore::with_config(EngineConfig::default().with_cache(false));
    uncached.load(&snapshot).unwrap();
    let uncached_result = uncached.get_effective_value(&top);

    for result in [&cold_result, &warm_result, &uncached_result] {
        assert_eq!(result.as_ref().unwrap_err().kind(), ErrorKind::DepthExceeded);
    }

    // Reads within the cap still succeed from memory
    let mid = path("Chain", "Links", "L64");
    assert_eq!(warm.get_effective_value(&mid).unwrap(), 65.0);
    let beyond = path("Chain", "Links", "L65");
    assert_eq!(
        warm.get_effective_value(&beyond).unwrap_err().kind(),
        ErrorKind::DepthExceeded
    );

    // Parallel evaluation agrees with sequential reads on an empty cache
    let parallel = ParameterStore::from_json(&snapshot).unwrap();
    for (p, result) in parallel.evaluate_all() {
        assert_eq!(
            result.is_ok(),
            uncached.get_effective_value(&p).is_ok(),
            "{}",
            p
        );
    }
}

#[test]
fn test_invalidation_and_unrelated_edits() {
    let mut store = ParameterStore::from_json(PLANT).unwrap();
    let headroom = path("Env", "Temp", "Headroom");
    let sync = path("Line 1", "Motor", "Sync Speed");

    assert!(approx_eq(store.get_effective_value(&headroom).unwrap(), 58.5, 1e-12));
    assert_eq!(store.get_effective_value(&sync).unwrap(), 50.0);

    // Unrelated literal leaves both derived values alone
    store.set_literal(&path("Env", "Humidity", "Relative"), 0.9).unwrap();
    assert!(approx_eq(store.get_effective_value(&headroom).unwrap(), 58.5, 1e-12));
    assert_eq!(store.get_effective_value(&sync).unwrap(), 50.0);

    store.set_literal(&path("Line 1", "Motor", "Poles"), 2.0).unwrap();
    assert_eq!(store.get_effective_value(&sync).unwrap(), 25.0);
    assert!(approx_eq(store.get_effective_value(&headroom).unwrap(), 58.5, 1e-12));

    store.set_literal(&path("Env", "Temp", "Ambient"), -20.0).unwrap();
    assert_eq!(store.get_effective_value(&headroom).unwrap(), 100.0);
}

#[test]
fn test_bounds_are_inclusive_and_never_clamped() {
    let mut store = ParameterStore::from_json(SCENARIO).unwrap();
    let a = path("Env", "Temp", "A");

    store.set_literal(&a, 0.0).unwrap();
    store.set_literal(&a, 100.0).unwrap();
    assert_eq!(store.get_effective_value(&a).unwrap(), 100.0);

    for bad in [-0.001, 100.001, f64::NAN, f64::INFINITY] {
        let err = store.set_literal(&a, bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds, "value {}", bad);
    }
    assert_eq!(store.get_effective_value(&a).unwrap(), 100.0);
}

#[test]
fn test_only_literals_accept_writes() {
    let mut store = ParameterStore::from_json(SCENARIO).unwrap();
    let b = path("Env", "Temp", "B");

    let err = store.set_literal(&b, 5.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, ParamError::NotLiteral { .. }));
    assert_eq!(store.get_effective_value(&b).unwrap(), 20.0);
}

#[test]
fn test_failed_load_keeps_previous_state() {
    let mut store = ParameterStore::from_json(PLANT).unwrap();
    let before = store.serialize().unwrap();

    assert!(store.load("not json").is_err());
    assert!(store.load(r#"{"Env":{"Temp":{"X":{"value":1}}}}"#).is_err());
    assert_eq!(store.serialize().unwrap(), before);

    store.load(SCENARIO).unwrap();
    assert!(store.get(&path("Env", "Temp", "Headroom")).is_err());
    assert_eq!(store.tree().len(), 2);
}

#[test]
fn test_recent_changes_and_reset() {
    let mut store = ParameterStore::from_json(PLANT).unwrap();
    let speed = path("Line 1", "Motor", "Speed");
    let max = path("Env", "Temp", "Max");

    store.set_literal(&speed, 1800.0).unwrap();
    store.set_literal(&max, 90.0).unwrap();
    let _ = store.set_literal(&max, 1000.0);

    let log: Vec<_> = store
        .recent_changes()
        .map(|c| (c.path.clone(), c.old, c.new))
        .collect();
    assert_eq!(log, vec![(speed.clone(), 1500.0, 1800.0), (max.clone(), 80.0, 90.0)]);

    store.reset_all();
    assert_eq!(store.get_effective_value(&speed).unwrap(), 1500.0);
    assert_eq!(store.get_effective_value(&max).unwrap(), 80.0);
    assert_eq!(store.recent_changes().count(), 0);
}

#[test]
fn test_evaluate_all_in_display_order() {
    let store = ParameterStore::from_json(PLANT).unwrap();
    let results = store.evaluate_all();

    let paths: Vec<_> = results.iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(paths, store.tree().paths());
    assert!(results.iter().all(|(_, r)| r.is_ok()));
}

#[test]
fn test_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("paramtree-store-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("plant.json");

    let mut store = ParameterStore::from_json(PLANT).unwrap();
    store.set_literal(&path("Env", "Temp", "Max"), 95.0).unwrap();
    store.save_file(&file).unwrap();

    let mut reloaded = ParameterStore::new();
    reloaded.load_file(&file).unwrap();
    assert_eq!(
        reloaded.get_effective_value(&path("Env", "Temp", "Max")).unwrap(),
        95.0
    );

    let missing = reloaded.load_file(dir.join("missing.json")).unwrap_err();
    assert!(matches!(missing, SerializationError::IoError(_)));

    std::fs::write(&file, "{").unwrap();
    let broken = reloaded.load_file(&file).unwrap_err();
    assert!(matches!(broken, SerializationError::Param(_)));
    assert_eq!(reloaded.tree().len(), 7);

    std::fs::remove_dir_all(&dir).unwrap();
}
