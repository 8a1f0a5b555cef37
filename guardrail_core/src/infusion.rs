//! Infusion volume and pump rate resolution.
//!
//! Picks the weight band for a patient, then resolves one infusion per
//! concentration preset in that band.

use crate::dose::INFUSION_HOURS;
use crate::{BandPolicy, ConcentrationBand, Error, InfusionResult, Result, WeightBand};

const TWO_POINT_FOUR_KG: f64 = 2.4;
const TWO_POINT_FIVE_KG: f64 = 2.5;

impl WeightBand {
    /// Whether `weight_kg` falls in this band under the given policy
    pub fn contains(&self, weight_kg: f64, policy: BandPolicy) -> bool {
        match self {
            WeightBand::UnderOneKg => weight_kg < 1.0,
            WeightBand::OneToTwoPointFourKg => (1.0..=TWO_POINT_FOUR_KG).contains(&weight_kg),
            WeightBand::OverTwoPointFiveKg => match policy {
                BandPolicy::Contiguous => weight_kg > TWO_POINT_FOUR_KG,
                BandPolicy::LegacyGap => weight_kg > TWO_POINT_FIVE_KG,
            },
        }
    }
}

/// Find the concentration band matching a patient weight
///
/// Returns `None` when no band matches, which only happens for weights in
/// (2.4, 2.5] under [`BandPolicy::LegacyGap`].
pub fn select_band(
    bands: &[ConcentrationBand],
    weight_kg: f64,
    policy: BandPolicy,
) -> Option<&ConcentrationBand> {
    bands
        .iter()
        .find(|band| band.weight_range.contains(weight_kg, policy))
}

/// Total solution volume (mL/24h) and hourly pump rate (mL/h)
pub fn resolve(diluent_volume_ml: f64, concentration: f64, total_dose: f64) -> Result<(f64, f64)> {
    let denominator = concentration * diluent_volume_ml;
    let undefined = Error::DivisionUndefined {
        concentration,
        diluent_volume_ml,
    };

    if denominator == 0.0 {
        return Err(undefined);
    }

    let total_volume_ml = total_dose / denominator;
    if !total_volume_ml.is_finite() {
        return Err(undefined);
    }

    Ok((total_volume_ml, total_volume_ml / INFUSION_HOURS))
}

/// Resolve every dose option in a band, preserving declared order
pub fn infuse_options(
    band: &ConcentrationBand,
    total_dose: f64,
    diluent_volume_ml: f64,
) -> Result<Vec<InfusionResult>> {
    band.dose_options
        .iter()
        .map(|&concentration| {
            let (total_volume_ml, hourly_rate_ml) =
                resolve(diluent_volume_ml, concentration, total_dose)?;
            tracing::debug!(
                "Concentration {}: {:.2} mL over 24h at {:.2} mL/h",
                concentration,
                total_volume_ml,
                hourly_rate_ml
            );
            Ok(InfusionResult {
                concentration,
                total_volume_ml,
                hourly_rate_ml,
            })
        })
        .collect()
}
