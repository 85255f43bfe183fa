use chorda_bridge::{decode, encode, load_preset, save_preset, DeviceIds, Error, MappingConfig, PresetMeta};

fn meta(name: &str) -> PresetMeta {
    PresetMeta {
        name: name.to_string(),
        version: 1,
        device: DeviceIds { input: Some("Chorda".into()), output: Some("IAC Bus 1".into()) },
    }
}

#[test]
fn round_trip_preserves_config_and_meta() {
    let configs = [
        MappingConfig::default(),
        MappingConfig::new(-24, 1, 1, 0.4, false),
        MappingConfig::new(24, 127, 127, 2.5, true),
        MappingConfig::new(7, 90, 30, 1.37, true),
    ];
    for config in configs {
        let text = encode(&config, &meta("Live")).unwrap();
        let (decoded, decoded_meta) = decode(&text, &MappingConfig::default().with_thru(!config.thru())).unwrap();
        assert_eq!(decoded, config);
        assert_eq!(decoded_meta, meta("Live"));
    }
}

#[test]
fn reads_presets_written_by_hand() {
    let text = r#"{
        "name": "Soft touch",
        "version": 1,
        "mapping": { "transpose": -3, "velMin": 20, "velMax": 110, "gamma": 0.6 },
        "thru": false,
        "device": { "inId": "", "outId": "Synth" }
    }"#;
    let (config, meta) = decode(text, &MappingConfig::default()).unwrap();
    assert_eq!(config, MappingConfig::new(-3, 20, 110, 0.6, false));
    assert_eq!(meta.name, "Soft touch");
    assert_eq!(meta.device, DeviceIds { input: None, output: Some("Synth".into()) });
}

#[test]
fn newer_versions_are_read_forward_compatibly() {
    let text = r#"{"version": 3, "mapping": {"transpose": 2, "swing": 0.5}, "layers": []}"#;
    let (config, meta) = decode(text, &MappingConfig::default()).unwrap();
    assert_eq!(config.transpose(), 2);
    assert_eq!(meta.version, 3);
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets").join("stage.json");
    let config = MappingConfig::new(5, 10, 120, 1.8, true);

    save_preset(&path, &config, &meta("Stage")).unwrap();
    let (loaded, loaded_meta) = load_preset(&path, &MappingConfig::default()).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded_meta.name, "Stage");
}

#[test]
fn failed_import_reports_error_kind() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(load_preset(&missing, &MappingConfig::default()), Err(Error::Io(_))));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{\"mapping\": ").unwrap();
    assert!(matches!(load_preset(&broken, &MappingConfig::default()), Err(Error::Format(_))));
}
