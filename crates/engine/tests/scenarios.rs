use carve_domain::{CatalogDocument, ComponentPath, FeatureFlagSet, Manifest, Node};
use carve_engine::compose::Composition;
use carve_engine::{Catalog, EngineError, ExportSlot, Registry, compose};
use carve_kernel::{load_catalog_document, load_manifest};
use std::path::PathBuf;

fn workspace_file(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative)
}

fn phaser() -> Registry {
    let document = load_catalog_document(workspace_file("catalogs/phaser-3.61.json")).unwrap();
    Registry::from_document(&document).unwrap()
}

fn manifest(raw: &str) -> Manifest {
    serde_json::from_str(raw).unwrap()
}

fn small_registry() -> Registry {
    let document: CatalogDocument = serde_json::from_str(
        r#"{
            "name": "small", "version": "0.0.1",
            "components": {
                "A": { "B": "mod/a/b", "C": "mod/a/c" },
                "D": "mod/d",
                "Sound": { "Base": "mod/sound/base", "Web": "mod/sound/web" }
            },
            "optional": [ { "flag": "sound", "attach": "Sound", "source": "Sound.*" } ],
            "constants": { "VERSION": "0.0.1", "AUTO": 0 }
        }"#,
    )
    .unwrap();
    Registry::from_document(&document).unwrap()
}

fn keys(ns: &carve_domain::Namespace) -> Vec<String> {
    ns.keys().map(str::to_owned).collect()
}

#[test]
fn sparse_manifest_selects_exactly_one_leaf() {
    let registry = small_registry();
    let out = Composition::new(&registry, "small")
        .resolve(&manifest(r#"{"A": {"B": true}}"#))
        .unwrap();

    assert_eq!(serde_json::to_string(out.namespace()).unwrap(), r#"{"A":{"B":"mod/a/b"}}"#);
}

#[test]
fn unknown_leaf_aborts_with_its_path() {
    let registry = small_registry();
    let err = Composition::new(&registry, "small")
        .resolve(&manifest(r#"{"A": {"Z": true}}"#))
        .unwrap_err();

    assert!(matches!(err, EngineError::UnknownComponent { ref path, .. } if path == "A.Z"));
    assert_eq!(err.to_string(), "Unknown component: 'A.Z'");
}

#[test]
fn disabled_sound_flag_removes_the_sound_key() {
    let registry = small_registry();
    let flags = FeatureFlagSet::new().with("sound", false);
    let composed = compose(&registry, "small", &manifest(r#"{"D": true}"#), &flags).unwrap();

    assert!(composed.get("Sound").is_none());
    assert!(composed.paths().iter().all(|p| p.segments()[0].as_ref() != "Sound"));
    assert_eq!(keys(&composed), ["D", "VERSION", "AUTO"]);
}

#[test]
fn enabled_sound_flag_grafts_at_attach_path_only() {
    let registry = small_registry();
    let flags = FeatureFlagSet::new().with("SOUND", true);
    let composed = compose(&registry, "small", &manifest(r#"{"D": true}"#), &flags).unwrap();

    let sound = composed.get("Sound").and_then(Node::as_branch).unwrap();
    assert_eq!(keys(sound), ["Base", "Web"]);

    let sound_leaves: Vec<ComponentPath> = composed
        .components()
        .into_iter()
        .filter(|(_, entry)| entry.path().segments()[0].as_ref() == "Sound")
        .map(|(output, _)| output)
        .collect();
    assert!(sound_leaves.iter().all(|p| p.starts_with(&ComponentPath::parse("Sound").unwrap())));
    assert_eq!(sound_leaves.len(), 2);
    assert_eq!(composed.flags().get("SOUND"), Some(true));
}

#[test]
fn direct_request_for_gated_leaf_is_rejected() {
    let registry = small_registry();
    let err = compose(
        &registry,
        "small",
        &manifest(r#"{"Audio": "Sound.Web"}"#),
        &FeatureFlagSet::new().with("sound", true),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::GatedComponent { ref flag, .. } if flag == "SOUND"));
}

#[test]
fn constant_colliding_with_a_component_is_rejected() {
    let document: CatalogDocument = serde_json::from_str(
        r#"{"name":"c","version":"1","components":{"AUTO":"mod/auto"},"constants":{"AUTO":0}}"#,
    )
    .unwrap();
    let registry = Registry::from_document(&document).unwrap();

    let err = compose(&registry, "c", &manifest(r#"{"AUTO": true}"#), &FeatureFlagSet::new())
        .unwrap_err();
    assert!(matches!(err, EngineError::ConstantCollision { ref name, .. } if name == "AUTO"));
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut catalog = Catalog::new();
    catalog.register(ComponentPath::parse("A.B").unwrap(), "one").unwrap();
    let err = catalog.register(ComponentPath::parse("A.B").unwrap(), "two").unwrap_err();
    assert_eq!(err.kind(), "DuplicatePath");
}

#[test]
fn failed_run_publishes_nothing() {
    let registry = small_registry();
    let slot = ExportSlot::new("Small");

    let result = Composition::new(&registry, "small")
        .resolve(&manifest(r#"{"A": {"B": true, "C": true, "Z": true, "D": "D"}}"#))
        .and_then(|run| run.apply_flags(&FeatureFlagSet::new()))
        .and_then(|run| run.merge_constants())
        .and_then(|run| run.export(&slot));

    assert!(result.is_err());
    assert!(!slot.is_published());
}

#[test]
fn export_slot_accepts_exactly_one_write() {
    let registry = small_registry();
    let slot = ExportSlot::new("Small");
    let run = || {
        Composition::new(&registry, "small")
            .resolve(&manifest(r#"{"D": true}"#))
            .and_then(|r| r.apply_flags(&FeatureFlagSet::new()))
            .and_then(|r| r.merge_constants())
    };

    let first = run().unwrap().export(&slot).unwrap();
    assert_eq!(**slot.get().unwrap(), *first);

    let err = run().unwrap().export(&slot).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExported { ref binding, .. } if binding == "Small"));
}

#[test]
fn phaser_catalog_registers_every_declared_component() {
    let registry = phaser();
    assert_eq!(registry.name(), "phaser");
    assert_eq!(registry.version(), "3.61.0");
    assert_eq!(registry.catalog().len(), 359);
    assert_eq!(registry.optional().flags(), ["FEATURE_SOUND", "WEBGL_RENDERER", "CANVAS_RENDERER"]);

    let sprite = registry.catalog().lookup(&ComponentPath::parse("GameObjects.Sprite").unwrap());
    assert!(sprite.is_ok());
}

#[test]
fn custom_build_contains_sprite_graphics_and_loader() {
    let registry = phaser();
    let custom = load_manifest(workspace_file("manifests/custom.json")).unwrap();
    let flags = FeatureFlagSet::new()
        .with("FEATURE_SOUND", false)
        .with("WEBGL_RENDERER", false)
        .with("CANVAS_RENDERER", false);

    let composed = compose(&registry, "phaser-custom", &custom, &flags).unwrap();

    assert_eq!(
        keys(&composed)[..7],
        ["Cameras", "Events", "Game", "GameObjects", "Loader", "Math", "VERSION"]
    );
    let game_objects = composed.get("GameObjects").and_then(Node::as_branch).unwrap();
    assert!(game_objects.contains_key("Graphics"));
    assert!(composed.get("Sound").is_none());
    assert!(composed.get("Renderer").is_none());

    let loader = composed.get("Loader").and_then(Node::as_branch).unwrap();
    assert!(loader.contains_key("LoaderPlugin"));
    assert!(loader.get("FileTypes").is_some_and(Node::is_branch));
}

#[test]
fn full_build_with_default_flags_has_every_component() {
    let registry = phaser();
    let full = load_manifest(workspace_file("manifests/full.json")).unwrap();
    let flags = FeatureFlagSet::from(carve_domain::BuildFlags::defaults());

    let composed = compose(&registry, "phaser-full", &full, &flags).unwrap();
    assert_eq!(composed.components().len(), 359);

    let renderer = composed.get("Renderer").and_then(Node::as_branch).unwrap();
    assert_eq!(keys(renderer), ["Events", "Snapshot", "WebGL", "Canvas"]);
    assert!(composed.get("Sound").is_some_and(Node::is_branch));
    assert_eq!(composed.keys().last(), Some("RIGHT"));
}

#[test]
fn sprite_builds_differ_only_in_selected_subtrees() {
    let registry = phaser();
    let flags = FeatureFlagSet::new();
    let sprite = load_manifest(workspace_file("manifests/sprite.json")).unwrap();
    let small = load_manifest(workspace_file("manifests/sprite-small-loader.json")).unwrap();

    let sprite = compose(&registry, "phaser-sprite", &sprite, &flags).unwrap();
    let small = compose(&registry, "phaser-sprite-small-loader", &small, &flags).unwrap();

    assert_eq!(keys(&sprite), keys(&small));
    assert!(small.components().len() < sprite.components().len());
    assert_eq!(sprite.get("GameObjects"), small.get("GameObjects"));
}
