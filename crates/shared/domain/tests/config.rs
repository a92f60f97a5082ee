use carve_domain::config::{CarveConfig, OutputConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let output = OutputConfig::default();
    assert_eq!(output.dir, std::path::PathBuf::from("dist"));
    assert_eq!(output.binding, "Phaser");
    assert!(output.source_map);
    assert!(output.surface);

    let cfg = CarveConfig::default();
    assert!(cfg.distributions.is_empty());
    assert!(cfg.flags.is_empty());
}

#[test]
fn carve_config_deserializes() {
    let raw = json!({
        "catalog": "catalogs/phaser-3.61.json",
        "output": { "dir": "build", "binding": "Phaser" },
        "flags": { "feature_sound": true },
        "distributions": [
            { "name": "phaser-custom", "manifest": "manifests/custom.json", "flags": { "FEATURE_SOUND": false } },
            { "name": "phaser-full", "manifest": "manifests/full.json", "minify": false }
        ]
    });

    let cfg: CarveConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.catalog, std::path::PathBuf::from("catalogs/phaser-3.61.json"));
    assert_eq!(cfg.output.dir, std::path::PathBuf::from("build"));
    assert!(cfg.output.source_map);
    assert_eq!(cfg.flags.get("FEATURE_SOUND"), Some(true));

    let custom = cfg.distribution("phaser-custom").expect("custom distribution");
    assert!(custom.minify);
    assert_eq!(custom.flags.get("feature_sound"), Some(false));
    assert!(!cfg.distribution("phaser-full").unwrap().minify);
    assert!(cfg.distribution("phaser-nope").is_none());
}

#[test]
fn deref_mut_clones_on_write() {
    let original = CarveConfig::default();
    let mut edited = original.clone();
    edited.output.binding = "Engine".to_owned();

    assert_eq!(original.output.binding, "Phaser");
    assert_eq!(edited.output.binding, "Engine");
}
