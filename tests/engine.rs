use std::sync::Arc;

use termlens::{
    Engine, EngineConfig, EngineRequest, EngineResponse, NewTerminologyEntry, RequestError,
    TerminologyCatalog, TerminologyEntry,
};

fn engine() -> Engine {
    let mut catalog = TerminologyCatalog::new();
    catalog
        .load(vec![
            TerminologyEntry {
                id: "os".into(),
                term: "openEuler".into(),
                aliases: vec!["openeuler".into()],
                category: "product".into(),
                definition: "Open source Linux distribution".into(),
                deprecated: None,
                preferred_term: None,
                context: None,
                examples: None,
            },
            TerminologyEntry {
                id: "rpm".into(),
                term: "RPM".into(),
                aliases: vec!["rpm".into()],
                category: "packaging".into(),
                definition: "Package format".into(),
                deprecated: None,
                preferred_term: None,
                context: None,
                examples: None,
            },
        ])
        .unwrap();
    Engine::new(catalog, EngineConfig::default())
}

#[test]
fn test_scan_reflects_catalog_mutations() {
    let engine = engine();
    let text = "Install openEuler using rpm packages";
    let first = engine.scan(text);
    assert_eq!(first, engine.scan(text));
    assert_eq!(first.len(), 2);

    engine.catalog().remove_term("rpm").unwrap();
    assert_eq!(engine.scan(text).len(), 1);

    engine
        .catalog()
        .add_term(NewTerminologyEntry::new("packages", "packaging"))
        .unwrap();
    let terms: Vec<String> = engine.scan(text).into_iter().map(|o| o.term).collect();
    assert_eq!(terms, vec!["openEuler", "packages"]);
}

#[test]
fn test_handle_json_diff() {
    let engine = engine();
    let response = engine
        .handle_json(r#"{"command":"diff","original":"ab","modified":"ac"}"#)
        .unwrap();
    match response {
        EngineResponse::Diff { segments, stats } => {
            assert_eq!(segments.len(), 3);
            assert_eq!(stats.total_changes, 2);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn test_diff_input_must_be_strings() {
    let err = EngineRequest::from_json(r#"{"command":"diff","original":42,"modified":"x"}"#)
        .unwrap_err();
    assert_eq!(err.code(), "DIFF_INPUT_INVALID");
    assert!(err.to_string().contains("original"));
    assert!(err.to_string().contains("number"));

    let err = EngineRequest::from_json(r#"{"command":"diff","original":"x"}"#).unwrap_err();
    assert_eq!(err.code(), "DIFF_INPUT_INVALID");
    assert!(err.to_string().contains("modified"));

    let err = EngineRequest::from_json(r#"{"command":"explode"}"#).unwrap_err();
    assert!(matches!(err, RequestError::Malformed(_)));
}

#[test]
fn test_handle_catalog_commands() {
    let engine = engine();

    let added = engine
        .handle_json(r#"{"command":"addTerm","entry":{"term":"DNF","category":"packaging"}}"#)
        .unwrap();
    let EngineResponse::TermAdded { entry } = added else {
        panic!("expected TermAdded");
    };
    assert_eq!(entry.term, "DNF");

    let removed = engine
        .handle(EngineRequest::RemoveTerm { id: "nope".into() })
        .unwrap();
    assert_eq!(removed, EngineResponse::TermRemoved { removed: false });

    let categories = engine.handle(EngineRequest::ListCategories).unwrap();
    assert_eq!(
        categories,
        EngineResponse::Categories {
            categories: vec!["packaging".into(), "product".into()]
        }
    );

    let EngineResponse::Entries { entries } = engine
        .handle(EngineRequest::Search { query: "linux".into() })
        .unwrap()
    else {
        panic!("expected Entries");
    };
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "os");
}

#[test]
fn test_unloaded_engine_rejects_mutation() {
    let engine = Engine::new(TerminologyCatalog::new(), EngineConfig::default());
    let err = engine
        .handle(EngineRequest::AddTerm {
            entry: NewTerminologyEntry::new("RPM", "packaging"),
        })
        .unwrap_err();
    assert_eq!(err.code(), "CATALOG_NOT_LOADED");
    assert!(engine.scan("rpm").is_empty());
}

#[test]
fn test_check_response_shape() {
    let engine = engine();
    let response = engine
        .handle(EngineRequest::Check {
            text: "use rpm".into(),
        })
        .unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["kind"], "check");
    assert_eq!(json["report"]["correctedText"], "use RPM");
    assert_eq!(json["report"]["issues"][0]["severity"], "warning");
    assert_eq!(json["report"]["issues"][0]["range"], serde_json::json!([4, 7]));
}

#[test]
fn test_concurrent_readers_see_whole_snapshots() {
    let engine = Arc::new(engine());
    let text = "openEuler rpm";

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let n = engine.scan(text).len();
                    assert!(n == 1 || n == 2, "saw partial index: {n}");
                }
            })
        })
        .collect();

    for _ in 0..20 {
        let added = engine
            .catalog()
            .add_term(NewTerminologyEntry::new("tmp", "scratch"))
            .unwrap();
        engine.catalog().remove_term(&added.id).unwrap();
    }
    engine.catalog().remove_term("rpm").unwrap();

    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(engine.scan(text).len(), 1);
}
