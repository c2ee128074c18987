//! Profiles shipped with the crate.

use super::SpecProfile;

const EMBEDDED_OSHPARK_4LAYERS: &str = include_str!("../../profiles/oshpark-4layers.json");
const EMBEDDED_AC_STANDARD: &str = include_str!("../../profiles/advancedcircuits-standard.json");
const EMBEDDED_AC_66_DOLLARS: &str =
    include_str!("../../profiles/advancedcircuits-4layers66dollars.json");
const EMBEDDED_SEEEDSTUDIO: &str = include_str!("../../profiles/seeedstudio.json");

/// All embedded profiles, in catalog order.
pub fn builtin_profiles() -> Vec<SpecProfile> {
    let embedded_jsons = [
        EMBEDDED_OSHPARK_4LAYERS,
        EMBEDDED_AC_STANDARD,
        EMBEDDED_AC_66_DOLLARS,
        EMBEDDED_SEEEDSTUDIO,
    ];

    let mut profiles = Vec::new();

    for json_str in embedded_jsons {
        match serde_json::from_str::<SpecProfile>(json_str) {
            Ok(profile) => profiles.push(profile),
            Err(e) => {
                tracing::warn!("Failed to parse embedded profile: {}", e);
            }
        }
    }

    profiles
}

/// Look up a profile by name, ignoring ASCII case.
pub fn find_profile(name: &str) -> Option<SpecProfile> {
    builtin_profiles()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_embedded_profiles_parse() {
        let profiles = builtin_profiles();
        let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "oshpark-4layers",
                "AdvancedCircuits-standard",
                "AdvancedCircuits-4layers66dollars",
                "SeeedStudio",
            ]
        );
    }

    #[test]
    fn test_find_profile() {
        let seeed = find_profile("seeedstudio").unwrap();
        assert_eq!(seeed.drill, 11.81);
        assert_eq!(seeed.silkscreen_width, Some(6.0));
        assert_eq!(seeed.rules().len(), 7);
        assert!(find_profile("unknown-fab").is_none());
    }

    #[test]
    fn test_optional_rules_skipped() {
        let oshpark = find_profile("oshpark-4layers").unwrap();
        let rules: Vec<_> = oshpark.rules().into_iter().map(|(k, _)| k).collect();
        assert_eq!(rules, ["trace_width", "trace_spacing", "drill", "annular_ring"]);
        assert_eq!(oshpark.notes.len(), 1);
    }
}
