//! Tests for paths and the ParameterTree hierarchy

use crate::test_helpers::{approx_eq, path, PLANT};
use paramtree::parameters::{DerivedParam, LiteralParam, ParamPath, Parameter, ParameterTree};
use paramtree::ErrorKind;

#[test]
fn test_path_parsing() {
    let p: ParamPath = "Env##Temp##Max".parse().unwrap();
    assert_eq!(p, path("Env", "Temp", "Max"));
    assert_eq!(p.to_string(), "Env##Temp##Max");
    assert_eq!(p.segments(), ["Env", "Temp", "Max"]);

    let spaced: ParamPath = "Line 1##Motor##Sync Speed".parse().unwrap();
    assert_eq!(spaced.main, "Line 1");
    assert_eq!(spaced.item, "Sync Speed");

    for bad in ["Env##Temp", "Env##Temp##Max##Extra", "Env####Max", "", "Env##Te}mp##Max"] {
        let err = bad.parse::<ParamPath>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput, "input {:?}", bad);
    }
}

#[test]
fn test_declaration_order_is_kept() {
    let tree = ParameterTree::from_json(PLANT).unwrap();

    assert_eq!(tree.categories().collect::<Vec<_>>(), vec!["Env", "Line 1"]);
    assert_eq!(
        tree.sub_categories("Env").unwrap().collect::<Vec<_>>(),
        vec!["Temp", "Humidity"]
    );
    assert!(tree.sub_categories("Nope").is_none());

    let items: Vec<&str> = tree
        .items("Env", "Temp")
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(items, vec!["Ambient", "Max", "Headroom"]);

    let paths = tree.paths();
    assert_eq!(paths.len(), 7);
    assert_eq!(tree.len(), 7);
    assert_eq!(paths[0], path("Env", "Temp", "Ambient"));
    assert_eq!(paths[6], path("Line 1", "Motor", "Sync Speed"));
}

#[test]
fn test_item_variants() {
    let tree = ParameterTree::from_json(PLANT).unwrap();

    let ambient = tree.get(&path("Env", "Temp", "Ambient")).unwrap();
    let literal = ambient.as_literal().unwrap();
    assert_eq!(literal.value(), 21.5);
    assert_eq!(literal.lower(), -40.0);
    assert_eq!(literal.upper(), 60.0);
    assert_eq!(literal.unit, 1.0);
    assert_eq!(ambient.help(), "Outside air");

    // Missing help reads as empty
    let max = tree.get(&path("Env", "Temp", "Max")).unwrap();
    assert_eq!(max.help(), "");

    let headroom = tree.get(&path("Env", "Temp", "Headroom")).unwrap();
    assert!(headroom.is_derived());
    assert_eq!(
        headroom.as_derived().unwrap().expr(),
        "Env##Temp##Max - Env##Temp##Ambient"
    );
    assert_eq!(headroom.help(), "Degrees to spare");
}

#[test]
fn test_malformed_snapshots_are_rejected() {
    let cases = [
        // not a mapping
        r#"[1, 2, 3]"#,
        r#"{"Env": 5}"#,
        r#"{"Env":{"Temp":{"A": 10}}}"#,
        // missing unit
        r#"{"Env":{"Temp":{"A":{"value":1,"lower":0,"upper":2}}}}"#,
        // both variants at once
        r#"{"Env":{"Temp":{"A":{"expr":"1","value":1}}}}"#,
        // unknown field
        r#"{"Env":{"Temp":{"A":{"value":1,"lower":0,"upper":2,"unit":1,"colour":"red"}}}}"#,
        r#"{"Env":{"Temp":{"A":{"expr":"1","precision":3}}}}"#,
        // value outside bounds
        r#"{"Env":{"Temp":{"A":{"value":3,"lower":0,"upper":2,"unit":1}}}}"#,
        // inverted bounds
        r#"{"Env":{"Temp":{"A":{"value":1,"lower":2,"upper":0,"unit":1}}}}"#,
        // bad names
        r#"{"E#v":{"Temp":{"A":{"value":1,"lower":0,"upper":2,"unit":1}}}}"#,
        r#"{"Env":{"":{"A":{"value":1,"lower":0,"upper":2,"unit":1}}}}"#,
        r#"{"Env":{"Temp":{"A}":{"value":1,"lower":0,"upper":2,"unit":1}}}}"#,
        r#"{"Env":{"Temp ":{"A":{"value":1,"lower":0,"upper":2,"unit":1}}}}"#,
        r#"{" Env":{"Temp":{"A":{"value":1,"lower":0,"upper":2,"unit":1}}}}"#,
        // not JSON at all
        r#"{"Env":"#,
    ];

    for case in cases {
        let err = ParameterTree::from_json(case).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput, "snapshot {}", case);
    }
}

#[test]
fn test_unparsable_expression_still_loads() {
    let tree =
        ParameterTree::from_json(r#"{"Env":{"Temp":{"B":{"expr":"((Env##Temp##A"}}}}"#).unwrap();
    assert!(tree.contains(&path("Env", "Temp", "B")));
}

#[test]
fn test_insert() {
    let mut tree = ParameterTree::new();
    assert!(tree.is_empty());

    let previous = tree
        .insert(path("A", "B", "C"), LiteralParam::new(1.0, 0.0, 2.0, 1.0).unwrap())
        .unwrap();
    assert!(previous.is_none());

    let previous = tree
        .insert(path("A", "B", "C"), DerivedParam::new("2 * 3"))
        .unwrap();
    assert!(matches!(previous, Some(Parameter::Literal(_))));
    assert_eq!(tree.len(), 1);

    let err = tree
        .insert(path("A", "B#", "C"), DerivedParam::new("1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let err = tree
        .insert(path("A", "B", " C"), DerivedParam::new("1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_search() {
    let tree = ParameterTree::from_json(PLANT).unwrap();

    assert_eq!(
        tree.search("speed"),
        vec![
            path("Line 1", "Motor", "Speed"),
            path("Line 1", "Motor", "Sync Speed")
        ]
    );
    assert_eq!(tree.search("TEMP").len(), 3);
    assert_eq!(tree.search("").len(), 7);
    assert!(tree.search("pressure").is_empty());
}

#[test]
fn test_summarize() {
    let tree = ParameterTree::from_json(PLANT).unwrap();

    let env = tree.summarize("Env").unwrap();
    assert_eq!(env.items, 4);
    assert_eq!(env.literals, 3);
    assert_eq!(env.derived, 1);
    assert!(approx_eq(env.mean_lower.unwrap(), -40.0 / 3.0, 1e-12));
    assert!(approx_eq(env.mean_upper.unwrap(), 181.0 / 3.0, 1e-12));

    let derived_only = ParameterTree::from_json(r#"{"X":{"Y":{"Z":{"expr":"1"}}}}"#).unwrap();
    let summary = derived_only.summarize("X").unwrap();
    assert_eq!(summary.literals, 0);
    assert!(summary.mean_lower.is_none());

    assert!(tree.summarize("Nope").is_none());
}
