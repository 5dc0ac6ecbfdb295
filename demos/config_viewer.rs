//! Example of driving a ParameterStore the way an editing front end does.
//!
//! This example loads a snapshot (from the file given on the command line, or
//! a built-in sample), lists every parameter with its effective value, edits a
//! few literals, and prints the serialized result.
//!
//! Run with `cargo run --example config_viewer [snapshot.json]`.

use paramtree::parameters::{ParamPath, Parameter};
use paramtree::{EngineConfig, ParameterStore};
use std::error::Error;

const SAMPLE: &str = r#"{
    "Env": {
        "Temp": {
            "Ambient": {"value": 21.5, "lower": -40, "upper": 60, "unit": 1, "help": "Outside air temperature"},
            "Max": {"value": 80, "lower": 0, "upper": 120, "unit": 1, "help": "Shutdown threshold"},
            "Headroom": {"expr": "Env##Temp##Max - Env##Temp##Ambient", "help": "Degrees before shutdown"}
        }
    },
    "Line 1": {
        "Motor": {
            "Speed": {"value": 1500, "lower": 0, "upper": 3000, "unit": 3, "help": "Shaft speed"},
            "Poles": {"value": 4, "lower": 2, "upper": 12, "unit": 0, "help": "Pole count"},
            "Sync Speed": {"expr": "{Line 1##Motor##Speed} * {Line 1##Motor##Poles} / 120"},
            "Broken": {"expr": "{Line 1##Motor##Speed} /"}
        }
    }
}"#;

fn print_tree(store: &ParameterStore) {
    let results = store.evaluate_all();
    let mut current: Option<(String, String)> = None;

    for (path, result) in results {
        let heading = (path.main.clone(), path.sub.clone());
        if current.as_ref() != Some(&heading) {
            println!("[{} / {}]", heading.0, heading.1);
            current = Some(heading);
        }

        let kind = match store.get(&path) {
            Ok(Parameter::Literal(literal)) => {
                format!("literal [{}, {}]", literal.lower(), literal.upper())
            }
            Ok(Parameter::Derived(derived)) => format!("= {}", derived.expr()),
            Err(_) => String::new(),
        };
        match result {
            Ok(value) => println!("  {:<12} {:>10.3}  {}", path.item, value, kind),
            Err(e) => println!("  {:<12} {:>10}  {} ({})", path.item, "error", kind, e),
        }
    }
    println!();
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("Parameter store example");
    println!("=======================\n");

    let config = EngineConfig::default().with_recent_changes_limit(8);
    let mut store = ParameterStore::with_config(config);
    match std::env::args().nth(1) {
        Some(file) => {
            println!("Loading {}\n", file);
            store.load_file(&file)?;
        }
        None => store.load(SAMPLE)?,
    }

    // 1. Browse the tree
    println!("1. Current values");
    println!("-----------------");
    print_tree(&store);

    for main in store.tree().categories() {
        if let Some(summary) = store.tree().summarize(main) {
            println!(
                "{}: {} items ({} literal, {} derived), mean range [{}, {}]",
                main,
                summary.items,
                summary.literals,
                summary.derived,
                summary.mean_lower.map_or("-".to_string(), |v| format!("{:.2}", v)),
                summary.mean_upper.map_or("-".to_string(), |v| format!("{:.2}", v)),
            );
        }
    }
    println!();

    // 2. Edit literals; derived values follow
    println!("2. Editing");
    println!("----------");
    let edits = [
        ("Env##Temp##Ambient", 35.0),
        ("Line 1##Motor##Poles", 6.0),
        ("Env##Temp##Max", 500.0),
        ("Env##Temp##Headroom", 10.0),
    ];
    for (text, value) in edits {
        let path: ParamPath = text.parse()?;
        match store.set_literal(&path, value) {
            Ok(()) => println!("set {} = {}", path, value),
            Err(e) => println!("rejected {} = {}: {}", path, value, e),
        }
    }
    println!();
    print_tree(&store);

    // 3. Explore relationships
    println!("3. Dependencies");
    println!("---------------");
    for path in store.tree().search("speed") {
        let dependents = store.dependents(&path);
        match store.dependencies(&path) {
            Ok(deps) => println!(
                "{} reads {} parameter(s), feeds {}",
                path,
                deps.len(),
                dependents.len()
            ),
            Err(e) => println!("{}: {}", path, e),
        }
    }
    println!(
        "ad hoc: Headroom * 2 = {}",
        store.evaluate_expression("Env##Temp##Headroom * 2")?
    );
    println!();

    // 4. Review and persist
    println!("4. Recent changes");
    println!("-----------------");
    for change in store.recent_changes() {
        println!("{}: {} -> {}", change.path, change.old, change.new);
    }
    println!();

    println!("Serialized snapshot:");
    println!("{}", store.serialize()?);

    store.reset_all();
    println!("\nAfter reset, {} edits recorded", store.recent_changes().count());

    Ok(())
}
