use super::*;

use std::collections::HashMap;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_automaton_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings =
        load_settings_from(&dir.path().join("none.toml"), env_of(&[])).expect("settings");
    assert_eq!(settings.api_url, DEFAULT_API_URL);
    assert_eq!(
        settings.automaton_config().expect("config"),
        AutomatonConfig::default()
    );
    assert_eq!(settings.classifier_config(), ClassifierConfig::default());
}

#[test]
fn file_then_env_layering() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("controller.toml");
    fs::write(
        &path,
        "api_url = \"http://bridge:5000/api/control\"\nfist_threshold = 8\ncooldown_secs = 1.5\n",
    )
    .expect("write");

    let settings = load_settings_from(
        &path,
        env_of(&[("GESTURE__FIST_THRESHOLD", "3"), ("GESTURE__DRY_RUN", "true")]),
    )
    .expect("settings");
    assert_eq!(settings.api_url, "http://bridge:5000/api/control");
    assert_eq!(settings.fist_threshold, 3);
    assert!(settings.dry_run);

    let automaton = settings.automaton_config().expect("config");
    assert_eq!(automaton.cooldown, Duration::from_millis(1500));
    assert_eq!(automaton.fist_threshold, 3);
}

#[test]
fn invalid_env_value_names_the_variable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_settings_from(
        &dir.path().join("none.toml"),
        env_of(&[("GESTURE__CONFIRM_WINDOW", "many")]),
    )
    .expect_err("not a number");
    assert!(err.to_string().contains("GESTURE__CONFIRM_WINDOW"));
}

#[test]
fn negative_timeouts_are_rejected() {
    let settings = Settings {
        ready_timeout_secs: -1.0,
        ..Settings::default()
    };
    assert!(settings.automaton_config().is_err());
}

#[test]
fn frame_interval_follows_target_fps() {
    let settings = Settings {
        target_fps: 20.0,
        ..Settings::default()
    };
    assert_eq!(
        settings.frame_interval().expect("interval"),
        Duration::from_millis(50)
    );

    let settings = Settings {
        target_fps: 0.0,
        ..Settings::default()
    };
    assert!(settings.frame_interval().is_err());
}
