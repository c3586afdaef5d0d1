//! Meteorological and cloud-microphysics equations
//!
//! Units follow the usual conventions of the analysis scripts: temperature in
//! kelvin, pressure in pascals for [`qsatw`] and hectopascals elsewhere, droplet
//! effective radius in metres and liquid water path in kg m⁻².

use crate::errors::{Result, ToolboxError};
use ndarray::{ArrayD, Zip};
use std::f64::consts::{PI, SQRT_2};

/// Triple point of water (K)
const T0: f64 = 273.16;
/// Gravitational acceleration (m s⁻²)
const G: f64 = 9.81;
/// Gas constant of dry air (J kg⁻¹ K⁻¹)
const R_DRY: f64 = 287.04;
/// Latent heat of vaporisation (J kg⁻¹)
const L_V: f64 = 2.5e6;
/// Specific heat of dry air at constant pressure (J kg⁻¹ K⁻¹)
const CP: f64 = 1004.67;
/// Ratio of the gas constants of dry air and water vapour
const EPS: f64 = 0.622;

/// Pressure used by [`gamma_ad_default`] (hPa)
pub const DEFAULT_PRESSURE_HPA: f64 = 900.0;

/// Saturation specific humidity with respect to water (kg/kg).
///
/// Formulation of Unified Model Documentation Paper No. 29 (Smith et al. 1990).
/// `t` is temperature in K and `p` pressure in Pa. An infinite result is
/// reported as 0.
#[must_use]
pub fn qsatw(t: f64, p: f64) -> f64 {
    let log10_esw = 10.79574 * (1.0 - T0 / t) - 5.028 * (t / T0).log10()
        + 1.50475e-4 * (1.0 - 10f64.powf(-8.2369 * (t / T0 - 1.0)))
        + 0.42873e-3 * (10f64.powf(4.76955 * (1.0 - T0 / t)) - 1.0)
        + 2.78614;
    let esw = 10f64.powf(log10_esw);
    let qsw = 0.62198 * esw / (p - esw);

    if qsw.is_infinite() {
        0.0
    } else {
        qsw
    }
}

/// Adiabatic rate of increase of liquid water content with height (g m⁻³ per m).
///
/// `t` is temperature in K and `p` pressure in hPa.
#[must_use]
pub fn adiabatic_lwc_rate(t: f64, p: f64) -> f64 {
    let qs = qsatw(t, 100.0 * p);
    let rho = 100.0 * p / (R_DRY * t);

    let dqldz = (G * qs / (R_DRY * t)) * (L_V * EPS / (CP * t) - 1.0)
        / (1.0 + EPS * L_V * L_V * qs / (R_DRY * t * t * CP));
    rho * dqldz * 1000.0
}

/// Adiabatic condensation rate in kg m⁻³ per m (of order 2e-6)
#[must_use]
pub fn gamma_ad(t: f64, p: f64) -> f64 {
    1.0e-3 * adiabatic_lwc_rate(t, p)
}

/// [`gamma_ad`] at [`DEFAULT_PRESSURE_HPA`]
#[must_use]
pub fn gamma_ad_default(t: f64) -> f64 {
    gamma_ad(t, DEFAULT_PRESSURE_HPA)
}

/// Droplet number concentration (m⁻³) from liquid water path and effective radius.
///
/// `gamma_ad` is the adiabatic condensation rate, `frac_ad` the adiabatic
/// fraction (about 1), `lwp` in kg m⁻² and `re` in m. Returns NaN when `lwp` or
/// `re` is zero.
#[must_use]
pub fn droplet_number(gamma_ad: f64, frac_ad: f64, lwp: f64, re: f64) -> f64 {
    if lwp == 0.0 || re == 0.0 {
        return f64::NAN;
    }
    let b = (3.0 * SQRT_2 / (4.0 * PI * 1000.0)).powf(1.0 / 3.0);
    let k_ad = (frac_ad * gamma_ad).powf(1.0 / 6.0);
    b.powi(3) * (k_ad / re).powi(3) * lwp.sqrt() / martin_k(re)
}

/// Elementwise [`droplet_number`] over matching arrays of `lwp` and `re`.
///
/// # Errors
///
/// Returns [`ToolboxError::ShapeMismatch`] if the two arrays differ in shape.
pub fn droplet_number_array(
    gamma_ad: f64,
    frac_ad: f64,
    lwp: &ArrayD<f64>,
    re: &ArrayD<f64>,
) -> Result<ArrayD<f64>> {
    if lwp.shape() != re.shape() {
        return Err(ToolboxError::ShapeMismatch(format!(
            "LWP has shape {:?} but re has shape {:?}",
            lwp.shape(),
            re.shape()
        )));
    }
    Ok(Zip::from(lwp)
        .and(re)
        .map_collect(|&l, &r| droplet_number(gamma_ad, frac_ad, l, r)))
}

/// Martin et al. (1994) ratio of volume to effective radius cubed
fn martin_k(re: f64) -> f64 {
    if re < 3.0e-6 {
        return 0.45;
    }
    let k = 0.865 - (-0.30 * re * 1.0e6).exp();
    if k.is_infinite() {
        0.8
    } else {
        k
    }
}
