//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::NavigationOptions;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid key paths for `NavigationOptions`.
///
/// Any new field added to `NavigationOptions` must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        "snap_to_route",
        "off_route_minimum_distance_meters",
        "off_route_radius",
        "accuracy_multiplier",
        "max_radius",
        "off_route_minimum_distance_before_right_direction",
        "moving_away_run_length",
        "maneuver_zone_radius",
        "default_milestones_enabled",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the alphabetically first key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    // parse errors are reported by the serde pass
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Check value ranges on parsed options.
///
/// Returns (errors, warnings): errors are impossible values that must reject
/// the config, warnings are legal but likely mistakes.
pub fn validate_ranges(options: &NavigationOptions) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let distances = [
        (
            "off_route_minimum_distance_meters",
            options.off_route_minimum_distance_meters,
        ),
        ("off_route_radius", options.off_route_radius),
        ("accuracy_multiplier", options.accuracy_multiplier),
        ("max_radius", options.max_radius),
        (
            "off_route_minimum_distance_before_right_direction",
            options.off_route_minimum_distance_before_right_direction,
        ),
        ("maneuver_zone_radius", options.maneuver_zone_radius),
    ];
    for (name, value) in distances {
        if !value.is_finite() {
            errors.push(format!("{name} = {value} must be a finite number"));
        } else if value < 0.0 {
            errors.push(format!("{name} = {value:.1} cannot be negative"));
        }
    }

    if options.max_radius < options.off_route_radius {
        errors.push(format!(
            "max_radius ({:.1}) must be >= off_route_radius ({:.1})",
            options.max_radius, options.off_route_radius
        ));
    }

    if options.moving_away_run_length == 0 {
        errors.push("moving_away_run_length must be > 0".to_string());
    }

    if options.off_route_radius == 0.0 {
        warnings.push(ValidationWarning {
            field: "off_route_radius".to_string(),
            message: "off_route_radius = 0 makes every fix away from the geometry a candidate"
                .to_string(),
            suggestion: None,
        });
    }

    if options.maneuver_zone_radius > options.off_route_radius && options.off_route_radius > 0.0 {
        warnings.push(ValidationWarning {
            field: "maneuver_zone_radius".to_string(),
            message: format!(
                "maneuver_zone_radius ({:.1}) exceeds off_route_radius ({:.1})",
                options.maneuver_zone_radius, options.off_route_radius
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("radius", "radius"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("max_raduis", "max_radius"), 2);
        assert_eq!(levenshtein("max_radus", "max_radius"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r"
            snap_to_route = true
            [extra]
            field = 1
        "
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"snap_to_route".to_string()));
        assert!(keys.contains(&"extra".to_string()));
        assert!(keys.contains(&"extra.field".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys("off_route_radus = 60.0\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "off_route_radus");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("off_route_radius"));
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r"
snap_to_route = false
off_route_radius = 60.0
max_radius = 250.0
moving_away_run_length = 4
";
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_ranges_defaults_clean() {
        let (errors, warnings) = validate_ranges(&NavigationOptions::default());
        assert!(errors.is_empty(), "Defaults should produce no errors: {errors:?}");
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {warnings:?}");
    }

    #[test]
    fn test_ranges_negative_radius() {
        let options = NavigationOptions {
            off_route_radius: -1.0,
            ..NavigationOptions::default()
        };
        let (errors, _) = validate_ranges(&options);
        assert!(errors.iter().any(|e| e.contains("off_route_radius")));
    }

    #[test]
    fn test_ranges_nan_rejected() {
        let options = NavigationOptions {
            accuracy_multiplier: f64::NAN,
            ..NavigationOptions::default()
        };
        let (errors, _) = validate_ranges(&options);
        assert!(errors.iter().any(|e| e.contains("accuracy_multiplier")));
    }

    #[test]
    fn test_ranges_max_below_base() {
        let options = NavigationOptions {
            max_radius: 10.0,
            ..NavigationOptions::default()
        };
        let (errors, _) = validate_ranges(&options);
        assert!(errors.iter().any(|e| e.contains("max_radius")));
    }

    #[test]
    fn test_ranges_zero_run_length() {
        let options = NavigationOptions {
            moving_away_run_length: 0,
            ..NavigationOptions::default()
        };
        let (errors, _) = validate_ranges(&options);
        assert!(errors.iter().any(|e| e.contains("moving_away_run_length")));
    }
}
