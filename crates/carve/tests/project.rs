use carve::{BuildOverrides, CarveError, Project};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const CATALOG: &str = r#"{
    "name": "mini", "version": "1.2.0",
    "components": {
        "Game": "core/Game",
        "GameObjects": { "Sprite": "gameobjects/Sprite", "Text": "gameobjects/Text" },
        "Sound": { "WebAudio": "sound/WebAudio" }
    },
    "optional": [ { "flag": "FEATURE_SOUND", "attach": "Sound", "source": "Sound.*" } ],
    "constants": { "VERSION": "1.2.0" }
}"#;

const CONFIG: &str = r#"
catalog = "catalog.json"

[output]
dir = "out"
binding = "Mini"

[flags]
FEATURE_SOUND = true

[[distributions]]
name = "mini-sprite"
manifest = "manifests/sprite.json"
[distributions.flags]
FEATURE_SOUND = false

[[distributions]]
name = "mini-full"
manifest = "manifests/full.json"
minify = false

[[distributions]]
name = "mini-broken"
manifest = "manifests/broken.json"
"#;

fn fixture() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("manifests")).unwrap();
    fs::write(root.join("catalog.json"), CATALOG).unwrap();
    fs::write(root.join("manifests/sprite.json"), r#"{"Game": true, "GameObjects": {"Sprite": true}}"#)
        .unwrap();
    fs::write(root.join("manifests/full.json"), r#"{"Game": true, "GameObjects": "GameObjects.*"}"#)
        .unwrap();
    fs::write(root.join("manifests/broken.json"), r#"{"Physics": true}"#).unwrap();
    fs::write(root.join("carve.toml"), CONFIG).unwrap();
    let config = root.join("carve.toml");
    (dir, config)
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[test]
fn loads_config_and_registry_relative_to_the_file() {
    let (_dir, config) = fixture();
    let project = Project::load(&config).unwrap();

    assert_eq!(project.registry().name(), "mini");
    assert_eq!(project.registry().catalog().len(), 4);
    assert_eq!(project.distribution_names(), ["mini-sprite", "mini-full", "mini-broken"]);
    assert_eq!(project.output_dir(&BuildOverrides::default()), config.parent().unwrap().join("out"));
}

#[test]
fn flag_layers_apply_in_order() {
    let (_dir, config) = fixture();
    let project = Project::load(&config).unwrap();

    let sprite = project.effective_flags("mini-sprite", &BuildOverrides::default()).unwrap();
    assert_eq!(sprite.get("FEATURE_SOUND"), Some(false));
    assert_eq!(sprite.get("CANVAS_RENDERER"), Some(true));
    assert_eq!(sprite.get("PLUGIN_3D"), Some(false));

    let forced = BuildOverrides::default().enable("feature_sound").disable("canvas_renderer");
    let sprite = project.effective_flags("mini-sprite", &forced).unwrap();
    assert_eq!(sprite.get("FEATURE_SOUND"), Some(true));
    assert_eq!(sprite.get("CANVAS_RENDERER"), Some(false));
}

#[test]
fn compose_honours_distribution_flags() {
    let (_dir, config) = fixture();
    let project = Project::load(&config).unwrap();

    let sprite = project.compose("mini-sprite", &BuildOverrides::default()).unwrap();
    assert!(sprite.get("Sound").is_none());
    assert_eq!(sprite.keys().collect::<Vec<_>>(), ["Game", "GameObjects", "VERSION"]);

    let full = project.compose("mini-full", &BuildOverrides::default()).unwrap();
    assert_eq!(full.keys().collect::<Vec<_>>(), ["Game", "GameObjects", "Sound", "VERSION"]);
}

#[test]
fn unknown_distribution_is_reported_by_name() {
    let (_dir, config) = fixture();
    let project = Project::load(&config).unwrap();

    let err = project.compose("nope", &BuildOverrides::default()).unwrap_err();
    assert!(matches!(err, CarveError::UnknownDistribution { ref name, .. } if name == "nope"));
}

#[test]
fn composition_errors_keep_the_engine_cause() {
    let (_dir, config) = fixture();
    let project = Project::load(&config).unwrap();

    let err = project.compose("mini-broken", &BuildOverrides::default()).unwrap_err();
    assert_eq!(err.kind(), "Engine");
    assert!(err.to_string().contains("'Physics'"), "{err}");
}

#[test]
fn missing_catalog_fails_the_load() {
    let (dir, config) = fixture();
    fs::remove_file(dir.path().join("catalog.json")).unwrap();

    let err = Project::load(&config).unwrap_err();
    assert_eq!(err.kind(), "Load");
}

#[tokio::test]
async fn build_writes_every_artifact() {
    let (_dir, config) = fixture();
    let project = Project::load(&config).unwrap();

    let report = project.build("mini-sprite", &BuildOverrides::default()).await.unwrap();
    assert_eq!(report.components, 2);
    assert_eq!(
        file_names(&report.artifacts),
        ["mini-sprite.js", "mini-sprite.js.map.json", "mini-sprite.min.js", "mini-sprite.surface.json"]
    );

    let module = fs::read_to_string(&report.artifacts[0]).unwrap();
    assert!(module.starts_with("// mini v1.2.0 (mini-sprite)\nvar Mini = {"));
    assert!(module.ends_with("module.exports = Mini;\nglobal.Mini = Mini;\n"));
    assert!(!module.contains("sound/"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn build_all_reports_in_request_order() {
    let (_dir, config) = fixture();
    let project = Project::load(&config).unwrap();
    let out = tempdir().unwrap();
    let overrides = BuildOverrides::default().out_dir(out.path());

    let names = ["mini-full".to_owned(), "mini-sprite".to_owned()];
    let reports = project.build_all(&names, &overrides).await.unwrap();

    assert_eq!(reports.iter().map(|r| r.distribution.as_str()).collect::<Vec<_>>(), names);
    assert_eq!(reports[0].components, 4);
    // `minify = false` for mini-full.
    assert_eq!(reports[0].artifacts.len(), 3);
    assert!(out.path().join("mini-sprite.min.js").exists());
    assert!(!out.path().join("mini-full.min.js").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn build_all_fails_on_the_first_broken_distribution() {
    let (_dir, config) = fixture();
    let project = Project::load(&config).unwrap();
    let out = tempdir().unwrap();

    let err = project
        .build_all(&[], &BuildOverrides::default().out_dir(out.path()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Engine");
    let leftovers: Vec<_> = fs::read_dir(out.path()).unwrap().flatten().map(|e| e.file_name()).collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[tokio::test]
async fn rebuild_removes_artifacts_no_longer_emitted() {
    let (dir, config) = fixture();
    let project = Project::load(&config).unwrap();
    let out = tempdir().unwrap();
    let overrides = BuildOverrides::default().out_dir(out.path());

    project.build("mini-sprite", &overrides).await.unwrap();
    assert!(out.path().join("mini-sprite.min.js").exists());

    let sprite = "manifest = \"manifests/sprite.json\"\n";
    let lean = CONFIG.replacen(sprite, &format!("{sprite}minify = false\n"), 1);
    fs::write(dir.path().join("carve.toml"), lean).unwrap();
    let project = Project::load(&config).unwrap();

    let report = project.build("mini-sprite", &overrides).await.unwrap();
    assert_eq!(
        file_names(&report.artifacts),
        ["mini-sprite.js", "mini-sprite.js.map.json", "mini-sprite.surface.json"]
    );
    assert!(!out.path().join("mini-sprite.min.js").exists());
}

#[test]
fn check_all_composes_the_shipped_phaser_distributions() {
    let project = Project::load(workspace_root().join("carve.toml")).unwrap();

    let checked = project.check_all(&[], &BuildOverrides::default()).unwrap();
    let names: Vec<_> = checked.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["phaser-custom", "phaser-sprite", "phaser-sprite-small-loader", "phaser-full"]);

    let full = checked.iter().find(|(name, _)| name == "phaser-full").unwrap();
    assert_eq!(full.1, 359);
}
