use dmtool::settings::{AppConfig, Settings, MAX_REVEAL_SIZE, MIN_IMAGE_SIZE, SAVE_DELAY};
use dmtool::SettingsEvent;
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[test]
fn settings_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let config = AppConfig {
        max_image_size: 650.0,
        install_context_menu: false,
        show_debug_info: true,
        enable_fog_of_war: true,
        fog_reveal_size: 80.0,
        target_display_index: 1,
        offset_x: -20,
        offset_y: 35,
    };
    config.save(&path).unwrap();

    let loaded = AppConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let settings = Settings::load(dir.path().join("settings.json"));
    assert_eq!(settings.config(), &AppConfig::default());
    assert!(!settings.is_dirty());
}

#[test]
fn malformed_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ max_image_size: ").unwrap();

    let settings = Settings::load(path);
    assert_eq!(settings.config(), &AppConfig::default());
}

#[test]
fn absent_fields_take_their_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "enable_fog_of_war": true, "offset_x": 12 }"#).unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert!(config.enable_fog_of_war);
    assert_eq!(config.offset_x, 12);
    assert_eq!(config.max_image_size, 400.0);
    assert_eq!(config.fog_reveal_size, 50.0);
    assert_eq!(config.target_display_index, -1);
    assert!(config.install_context_menu);
    assert!(!config.show_debug_info);
}

#[test]
fn hand_edited_values_are_sanitized() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{ "max_image_size": 3.0, "fog_reveal_size": 9000.0, "target_display_index": -7 }"#,
    )
    .unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.max_image_size, MIN_IMAGE_SIZE);
    assert_eq!(config.fog_reveal_size, MAX_REVEAL_SIZE);
    assert_eq!(config.target_display_index, -1);
}

#[test]
fn setters_report_only_real_changes() {
    let dir = tempdir().unwrap();
    let mut settings = Settings::new(AppConfig::default(), dir.path().join("settings.json"));

    assert_eq!(settings.set_fog_enabled(false), None);
    assert_eq!(
        settings.set_fog_enabled(true),
        Some(SettingsEvent::FogEnabledChanged(true))
    );
    assert_eq!(settings.set_fog_enabled(true), None);

    assert_eq!(
        settings.set_offset(10, 0),
        Some(SettingsEvent::OffsetChanged { x: 10, y: 0 })
    );
    assert_eq!(settings.set_offset(10, 0), None);

    assert_eq!(settings.set_target_display_index(-1), None);
    assert_eq!(
        settings.set_target_display_index(-5),
        None,
        "values below -1 clamp to automatic"
    );
    assert_eq!(
        settings.set_target_display_index(2),
        Some(SettingsEvent::TargetDisplayChanged(2))
    );

    assert_eq!(
        settings.set_fog_reveal_size(1.0),
        Some(SettingsEvent::FogRevealSizeChanged(5.0))
    );
    assert_eq!(settings.set_fog_reveal_size(2.0), None);

    assert_eq!(
        settings.set_max_image_size(10.0),
        Some(SettingsEvent::MaxImageSizeChanged(MIN_IMAGE_SIZE))
    );
    assert_eq!(settings.set_install_context_menu(true), None);
    assert_eq!(
        settings.set_show_debug_info(true),
        Some(SettingsEvent::ShowDebugInfoChanged(true))
    );
}

#[test]
fn saves_wait_for_changes_to_settle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut settings = Settings::new(AppConfig::default(), path.clone());

    let start = Instant::now();
    assert!(!settings.save_if_due(start).unwrap(), "clean settings never save");

    settings.set_fog_enabled(true);
    settings.mark_dirty(start);
    assert!(settings.is_dirty());
    assert!(!settings.save_if_due(start + Duration::from_millis(100)).unwrap());
    assert!(!path.exists());

    assert!(settings.save_if_due(start + SAVE_DELAY).unwrap());
    assert!(!settings.is_dirty());
    assert!(AppConfig::load(&path).unwrap().enable_fog_of_war);
}

#[test]
fn explicit_save_clears_dirty_flag() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut settings = Settings::new(AppConfig::default(), path.clone());

    settings.set_offset(3, 4);
    settings.mark_dirty(Instant::now());
    settings.save().unwrap();

    assert!(!settings.is_dirty());
    let loaded = Settings::load(path);
    assert_eq!((loaded.config().offset_x, loaded.config().offset_y), (3, 4));
}
