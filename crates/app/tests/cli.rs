use clap::Parser;
use dmtool::Args;
use std::path::PathBuf;

#[test]
fn startup_keeps_every_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("map.png");
    let webp = dir.path().join("portrait.webp");
    let notes = dir.path().join("notes.txt");
    for path in [&png, &webp, &notes] {
        std::fs::write(path, b"contents").unwrap();
    }
    let missing = dir.path().join("gone.jpg");

    let args = Args::parse_from([
        PathBuf::from("dmtool"),
        png.clone(),
        missing,
        webp.clone(),
        notes.clone(),
        dir.path().to_path_buf(),
    ]);

    assert_eq!(args.startup_images(), vec![png, webp, notes]);
}

#[test]
fn config_flag_overrides_settings_path() {
    let args = Args::parse_from(["dmtool", "--debug", "--config", "custom.json"]);
    assert!(args.debug);
    assert_eq!(args.settings_path(), PathBuf::from("custom.json"));
    assert!(args.paths.is_empty());
}
