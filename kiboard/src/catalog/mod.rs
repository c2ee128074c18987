//! Manufacturer Capability Profiles
//!
//! Named tables of a board house's minimum capabilities, kept for reference
//! when choosing thresholds. Profiles are descriptive: the check engine
//! never reads them.
//!
//! Profiles are JSON files under `profiles/`, compiled into the binary.

pub mod builtin;

pub use builtin::{builtin_profiles, find_profile};

use serde::{Deserialize, Serialize};

/// Minimum capabilities of one manufacturing process. Lengths in mils.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecProfile {
    pub name: String,
    pub source: String,
    pub trace_width: f64,
    pub trace_spacing: f64,
    pub drill: f64,
    pub annular_ring: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_trace_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_trace_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silkscreen_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl SpecProfile {
    /// `(rule, value)` pairs in display order, skipping absent rules.
    pub fn rules(&self) -> Vec<(&'static str, f64)> {
        let mut rules = vec![
            ("trace_width", self.trace_width),
            ("trace_spacing", self.trace_spacing),
            ("drill", self.drill),
            ("annular_ring", self.annular_ring),
        ];
        let optional = [
            ("inner_trace_width", self.inner_trace_width),
            ("inner_trace_spacing", self.inner_trace_spacing),
            ("silkscreen_width", self.silkscreen_width),
        ];
        rules.extend(optional.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));
        rules
    }
}
