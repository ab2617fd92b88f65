//! Config Validation Tests
//!
//! Exercises option loading and the two validation passes (typo detection,
//! range validation) independently from the rest of the engine.

use std::io::Write;

use navigation_core::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use navigation_core::config::{ConfigError, NavigationOptions};

// ============================================================================
// Pass 1: Typo Detection
// ============================================================================

#[test]
fn typo_in_snap_flag_warns_with_suggestion() {
    let warnings = validate_unknown_keys("snap_to_rout = false\n");
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "snap_to_rout");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("snap_to_route"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r"
snap_to_route = true
off_route_minimum_distance_meters = 50.0
off_route_radius = 50.0
accuracy_multiplier = 1.0
max_radius = 300.0
off_route_minimum_distance_before_right_direction = 20.0
moving_away_run_length = 3
maneuver_zone_radius = 40.0
default_milestones_enabled = true
";
    assert!(validate_unknown_keys(toml_str).is_empty());
}

#[test]
fn every_known_key_round_trips_through_defaults() {
    let serialized = NavigationOptions::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&serialized).is_empty());
    assert_eq!(known_config_keys().len(), 9);
}

#[test]
fn unrelated_key_gets_no_suggestion() {
    let warnings = validate_unknown_keys("colour_scheme = \"dark\"\n");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].suggestion.is_none());
    assert!(suggest_correction("colour_scheme", &known_config_keys()).is_none());
}

#[test]
fn unknown_keys_do_not_reject_the_file() {
    let options = NavigationOptions::from_toml_str("max_radiuss = 10.0\nmax_radius = 250.0\n").unwrap();
    assert!((options.max_radius - 250.0).abs() < f64::EPSILON);
}

// ============================================================================
// Pass 2: Range Validation
// ============================================================================

#[test]
fn negative_radius_is_rejected() {
    let err = NavigationOptions::from_toml_str("off_route_radius = -5.0\n").unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.contains("off_route_radius")));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn max_radius_below_base_radius_is_rejected() {
    let options = NavigationOptions {
        off_route_radius: 100.0,
        max_radius: 80.0,
        ..NavigationOptions::default()
    };
    let (errors, _) = validate_ranges(&options);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("max_radius"));
}

#[test]
fn zero_run_length_is_rejected() {
    let options = NavigationOptions {
        moving_away_run_length: 0,
        ..NavigationOptions::default()
    };
    assert!(matches!(options.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn non_finite_values_are_rejected() {
    let options = NavigationOptions {
        accuracy_multiplier: f64::NAN,
        ..NavigationOptions::default()
    };
    let (errors, _) = validate_ranges(&options);
    assert!(errors.iter().any(|e| e.contains("accuracy_multiplier")));
}

#[test]
fn wide_maneuver_zone_is_only_a_warning() {
    let options = NavigationOptions {
        maneuver_zone_radius: 80.0,
        ..NavigationOptions::default()
    };
    let (errors, warnings) = validate_ranges(&options);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "maneuver_zone_radius");
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_from_file_reads_partial_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "snap_to_route = false").unwrap();
    writeln!(file, "accuracy_multiplier = 2.0").unwrap();

    let options = NavigationOptions::load_from_file(file.path()).unwrap();
    assert!(!options.snap_to_route);
    assert!((options.accuracy_multiplier - 2.0).abs() < f64::EPSILON);
    assert!((options.off_route_radius - 50.0).abs() < f64::EPSILON);
    assert!((options.effective_radius(40.0) - 80.0).abs() < f64::EPSILON);
}

#[test]
fn parse_error_names_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "off_route_radius = \"wide\"").unwrap();

    let err = NavigationOptions::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(ref path, _) if path == file.path()));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = NavigationOptions::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn effective_radius_is_capped() {
    let options = NavigationOptions::default();
    assert!((options.effective_radius(5.0) - 50.0).abs() < f64::EPSILON);
    assert!((options.effective_radius(120.0) - 120.0).abs() < f64::EPSILON);
    assert!((options.effective_radius(1000.0) - 300.0).abs() < f64::EPSILON);
}
