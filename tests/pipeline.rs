mod common;

use std::fs;
use std::sync::Arc;

use mapforge::config::BuildConfig;
use mapforge::model::MapId;
use mapforge::processor::optimizer::PassthroughOptimizer;
use serde_json::json;

fn config(project: &common::Project) -> BuildConfig {
    BuildConfig {
        output_root: project.dist(),
        ..BuildConfig::default()
    }
}

#[tokio::test]
async fn build_rewrites_optimized_maps() {
    let project = common::Project::new();
    project.bundle("index-0f1e2d3c.js");
    project.bundle("office-5a6b7c8d.js");
    project.bundle("office-5a6b7c8d.js.map");

    let reports = mapforge::build(&project.dir(), &config(&project), Arc::new(PassthroughOptimizer))
        .await
        .expect("build");

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].map, MapId::new("lobby"));
    assert_eq!(reports[0].script, None);

    let office = &reports[1];
    assert_eq!(office.image.as_deref(), Some("office.png"));
    assert_eq!(office.script.as_deref(), Some("assets/office-5a6b7c8d.js"));

    let optimized = project.read_json(&project.dist().join("office.json"));
    assert_eq!(
        optimized["properties"],
        json!([
            { "name": "mapName", "type": "string", "value": "Office" },
            { "name": "mapImage", "type": "string", "value": "office.png" },
            { "name": "script", "type": "string", "value": "assets/office-5a6b7c8d.js" }
        ])
    );
    // untouched parts of the map survive the rewrite
    let original = project.read_json(&project.dir().join("office.json"));
    assert_eq!(optimized["layers"], original["layers"]);
    assert_eq!(optimized["tilesets"], original["tilesets"]);
    assert_eq!(optimized["tiledversion"], json!("1.10.2"));

    assert_eq!(fs::read(project.dist().join("office.png")).unwrap(), b"PNGDATA");
    assert_eq!(
        original["properties"][2]["value"],
        json!("src/office.ts"),
        "source map must not change"
    );
}

#[tokio::test]
async fn build_fails_when_script_was_not_bundled() {
    let project = common::Project::new();
    project.bundle("index-0f1e2d3c.js");

    let err = mapforge::build(&project.dir(), &config(&project), Arc::new(PassthroughOptimizer))
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("src/office.ts"), "got: {message}");
}

#[tokio::test]
async fn build_fails_without_assets_folder() {
    let project = common::Project::new();
    fs::remove_dir(project.dist().join("assets")).unwrap();

    let err = mapforge::build(&project.dir(), &config(&project), Arc::new(PassthroughOptimizer))
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("assets build folder"), "got: {err:#}");
    assert!(!project.dist().join("office.json").exists());
}

#[test]
fn reconcile_one_uses_existing_optimized_map() {
    let project = common::Project::new();
    project.bundle("office.77aa88bb.js");
    fs::copy(
        project.dir().join("office.json"),
        project.dist().join("office.json"),
    )
    .unwrap();

    let report =
        mapforge::reconcile_one(&project.dir().join("office.json"), &config(&project)).expect("reconcile");

    assert_eq!(report.script.as_deref(), Some("assets/office.77aa88bb.js"));
    assert_eq!(report.image.as_deref(), Some("office.png"));
}
