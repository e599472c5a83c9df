//! End-to-end tests of loading documents and running a search.

use std::path::Path;

use clap::Parser;
use linkfind::{CliConfig, load_request, run};
use tokio_util::sync::CancellationToken;

const SCHEMA: &str = r#"{
    "datastore": "gis",
    "classes": [
        { "name": "Pole", "rows": [
            { "objectId": 1, "Name": "P-100" },
            { "objectId": 2, "Name": "P-X1-200" },
            { "objectId": 3, "Name": "P-300" }
        ] },
        { "name": "Anchor", "rows": [ { "objectId": 7, "Tag": "A9" } ] }
    ],
    "relationships": [
        { "id": 1, "name": "OwnsAnchor", "origin": "Pole", "destination": "Anchor", "pairs": [[3, 7]] }
    ],
    "layers": [ { "name": "Pole", "class": "Pole" } ]
}"#;

const REQUEST: &str = r#"{
    "keyword": "X1",
    "comparisonOperator": "contains",
    "packages": [ { "name": "Electric", "items": [
        { "type": "layer", "name": "Pole",
          "fields": [ { "name": "Name" } ],
          "relationships": [
              { "relationshipName": "OwnsAnchor", "name": "Anchor", "fields": [ { "name": "Tag" } ] }
          ] }
    ] } ]
}"#;

fn write_documents(dir: &Path) -> (String, String) {
    let schema = dir.join("schema.json");
    let request = dir.join("request.json");
    std::fs::write(&schema, SCHEMA).unwrap();
    std::fs::write(&request, REQUEST).unwrap();
    (
        schema.to_string_lossy().into_owned(),
        request.to_string_lossy().into_owned(),
    )
}

#[tokio::test]
async fn test_run_searches_loaded_documents() {
    let dir = tempfile::tempdir().unwrap();
    let (schema, request) = write_documents(dir.path());
    let config =
        CliConfig::try_parse_from(["linkfind", "--schema", schema.as_str(), "--request", request.as_str()]).unwrap();

    let response = run(&config, CancellationToken::new()).await.unwrap();

    assert!(response.contains("Pole", 2));
    assert_eq!(response.len(), 1);
    assert!(!response.cancelled);
}

#[tokio::test]
async fn test_keyword_override_reaches_related_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (schema, request) = write_documents(dir.path());
    let config = CliConfig::try_parse_from([
        "linkfind",
        "--schema",
        schema.as_str(),
        "--request",
        request.as_str(),
        "--keyword",
        "A9",
        "--sequential",
    ])
    .unwrap();

    assert_eq!(load_request(&config).unwrap().keyword, "A9");

    let response = run(&config, CancellationToken::new()).await.unwrap();
    assert!(response.contains("Pole", 3));
    assert!(response.get("Anchor").is_none());
}

#[tokio::test]
async fn test_missing_schema_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (_, request) = write_documents(dir.path());
    let missing = dir.path().join("missing.json").to_string_lossy().into_owned();
    let config = CliConfig::try_parse_from([
        "linkfind",
        "--schema",
        missing.as_str(),
        "--request",
        request.as_str(),
    ])
    .unwrap();

    let err = run(&config, CancellationToken::new()).await.unwrap_err();
    assert!(err.to_string().contains("loading schema"));
}
