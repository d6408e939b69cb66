//! Shallow-water wave transformation.
//!
//! Turns an open-water swell (height, period, direction) into an estimate of
//! the height it breaks at on a beach described by a [`BeachGeometry`].
//! All inputs and outputs are metric; gravity is 9.81 m/s².

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::tuning::BeachGeometry;
use crate::services::units::angular_distance;

const GRAVITY: f64 = 9.81;

/// Share of the solved breaking height reported as the maximum. Covers
/// refraction and bottom effects the straight-contour model ignores.
const BREAKING_SCALE: f64 = 0.8;

/// Ratio between the significant (max) and rms (min) breaking heights.
const SIGNIFICANT_TO_RMS: f64 = 1.4;

#[derive(Debug, Error, PartialEq)]
pub enum WaveSolverError {
    #[error("dispersion relation did not converge")]
    ConvergenceFailure,
}

/// Minimum and maximum breaking height, in the unit system of the sample
/// that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct BreakingWaveEstimate {
    pub minimum: f64,
    pub maximum: f64,
}

/// Wavelength for a wave of the given period at the given depth, solving the
/// linear dispersion relation with Newton-Raphson.
pub fn ldis(period: f64, depth: f64) -> Result<f64, WaveSolverError> {
    const EPS: f64 = 0.000001;
    const MAX_ITERATION: usize = 50;

    let omega = 2.0 * PI / period;
    let d = omega.powi(2) * depth / GRAVITY;

    let mut iter: usize = 0;
    let mut err: f64 = 1.0;
    let mut xf: f64 = 0.0;

    // Initial guess for the non-dimensional solution
    let mut xo = if d >= 1.0 { d } else { d.sqrt() };

    while err > EPS && iter < MAX_ITERATION {
        let f = xo - (d / xo.tanh());
        let df = 1.0 + (d / xo.sinh().powi(2));
        xf = xo - (f / df);
        err = ((xf - xo) / xo).abs();
        xo = xf;
        iter += 1;
    }

    if iter >= MAX_ITERATION {
        Err(WaveSolverError::ConvergenceFailure)
    } else {
        Ok(2.0 * PI * depth / xf)
    }
}

/// Breaking wave height and breaking water depth for a swell approaching a
/// straight beach with parallel bottom contours.
///
/// `incident_angle` is in degrees between the swell and the beach normal.
pub fn break_wave(
    period: f64,
    incident_angle: f64,
    deep_water_wave_height: f64,
    beach_slope: f64,
    water_depth: f64,
) -> Result<(f64, f64), WaveSolverError> {
    let incident_angle = incident_angle.to_radians();
    let wavelength = ldis(period, water_depth)?;

    let deep_wavelength = (GRAVITY * period.powi(2)) / (2.0 * PI);
    let initial_celerity = (GRAVITY * period) / (2.0 * PI);
    let celerity = wavelength / period;
    let theta = (celerity * (incident_angle.sin() / initial_celerity)).asin();
    let refraction_coefficient = (incident_angle.cos() / theta.cos()).sqrt();
    let a = 43.8 * (1.0 - (-19.0 * beach_slope).exp());
    let b = 1.56 / (1.0 + (-19.5 * beach_slope).exp());
    let deep_refracted_wave_height = refraction_coefficient * deep_water_wave_height;
    let w = 0.56 * (deep_refracted_wave_height / deep_wavelength).powf(-0.2);

    let breaking_wave_height = w * deep_refracted_wave_height;

    let k = b - a * (breaking_wave_height / (GRAVITY * period.powi(2)));
    let breaking_water_depth = breaking_wave_height / k;

    Ok((breaking_wave_height, breaking_water_depth))
}

/// Breaking height estimate for one swell train on a beach.
///
/// Swells arriving 90° or more off the beach normal never reach it and
/// yield a zero estimate, as do degenerate inputs.
pub fn estimate_breaking_heights(
    height: f64,
    period: f64,
    direction: f64,
    geometry: &BeachGeometry,
) -> BreakingWaveEstimate {
    if !(height > 0.0 && period > 0.0 && direction.is_finite()) {
        return BreakingWaveEstimate::default();
    }

    let incident_angle = angular_distance(direction, geometry.angle);
    if incident_angle >= 90.0 {
        return BreakingWaveEstimate::default();
    }

    match break_wave(period, incident_angle, height, geometry.slope, geometry.depth) {
        Ok((breaking_height, _)) if breaking_height.is_finite() => {
            let maximum = BREAKING_SCALE * breaking_height;
            BreakingWaveEstimate {
                minimum: maximum / SIGNIFICANT_TO_RMS,
                maximum,
            }
        }
        Ok(_) => BreakingWaveEstimate::default(),
        Err(e) => {
            tracing::debug!(
                "breaking solver failed for {:.2} m @ {:.1} s: {}",
                height,
                period,
                e
            );
            BreakingWaveEstimate::default()
        }
    }
}
