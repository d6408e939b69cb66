//! Per-spot beach geometry used by the breaking-wave solver.
//!
//! Spots are matched by name against an ordered rule table; the first rule
//! whose pattern is a case-insensitive substring of the spot name wins. New
//! spots are added by appending a rule.

use serde::Serialize;
use utoipa::ToSchema;

/// Bathymetry parameters of a surf spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct BeachGeometry {
    /// Reference water depth in metres
    pub depth: f64,
    /// Direction the beach faces, degrees clockwise from north
    pub angle: f64,
    /// Bottom slope (rise over run)
    pub slope: f64,
}

/// Geometry for spots no rule matches.
pub const DEFAULT_GEOMETRY: BeachGeometry = BeachGeometry {
    depth: 30.0,
    angle: 195.0,
    slope: 0.02,
};

/// One entry in the tuning table. `pattern` must be lowercase.
pub struct TuningRule {
    pub pattern: &'static str,
    pub geometry: BeachGeometry,
}

impl TuningRule {
    fn matches(&self, lowercase_name: &str) -> bool {
        lowercase_name.contains(self.pattern)
    }
}

/// Hand-tuned spots, in match priority order.
pub static TUNING_RULES: &[TuningRule] = &[
    TuningRule {
        pattern: "shell beach",
        geometry: BeachGeometry {
            depth: 30.0,
            angle: 195.0,
            slope: 0.01,
        },
    },
    // Gentler slope than Shell Beach, faces southwest
    TuningRule {
        pattern: "pismo beach",
        geometry: BeachGeometry {
            depth: 30.0,
            angle: 225.0,
            slope: 0.005,
        },
    },
    // Protected bay, faces west
    TuningRule {
        pattern: "morro bay",
        geometry: BeachGeometry {
            depth: 30.0,
            angle: 270.0,
            slope: 0.015,
        },
    },
];

/// Resolve the beach geometry for a spot name. Always returns a geometry.
pub fn tune(spot_name: &str) -> BeachGeometry {
    tune_with(TUNING_RULES, spot_name)
}

fn tune_with(rules: &[TuningRule], spot_name: &str) -> BeachGeometry {
    let name = spot_name.to_lowercase();
    let geometry = rules
        .iter()
        .find(|rule| rule.matches(&name))
        .map(|rule| rule.geometry)
        .unwrap_or(DEFAULT_GEOMETRY);

    tracing::debug!(
        "Tuned '{}': depth={}m angle={}° slope={}",
        spot_name,
        geometry.depth,
        geometry.angle,
        geometry.slope
    );

    geometry
}
