//! Calculation engine for infusion guardrails.
//!
//! This module runs a single dosing request end to end:
//! 1. Look the drug up in the catalog (unknown drug is fatal, and reported
//!    before any problem with weight or dose)
//! 2. Normalize the dose into the drug's canonical unit
//! 3. Check the dose against the accepted range (warning only)
//! 4. Compute the 24-hour total dose
//! 5. Select the weight band and resolve one infusion per concentration preset

use crate::{
    dose, infusion, units, validator, CalculationSettings, Catalog, DoseUnit, DosingReport,
    DosingRequest, Error, Result, UnitPolicy,
};

/// Calculate infusion parameters for one request
///
/// The catalog is passed in rather than read from a global so callers can
/// substitute a site-specific catalog.
pub fn calculate(
    catalog: &Catalog,
    request: &DosingRequest,
    settings: &CalculationSettings,
) -> Result<DosingReport> {
    let drug = catalog.lookup(&request.drug)?;
    check_request(request)?;
    let input_unit: DoseUnit = request.dose_unit.parse()?;

    tracing::info!(
        "Calculating {} for {} kg at {} {}",
        drug.name,
        request.weight_kg,
        request.dose,
        input_unit
    );

    let normalized_dose = units::normalize(request.dose, input_unit, drug.unit, settings.unit_policy)?;

    let check = validator::validate_dose(normalized_dose, drug.dosing_range.as_ref(), drug.unit);

    let total_dose = dose::total_dose(
        normalized_dose,
        request.weight_kg,
        is_per_minute_rate(input_unit, drug.unit, settings.unit_policy),
    );

    let results = match infusion::select_band(
        &drug.concentrations,
        request.weight_kg,
        settings.band_policy,
    ) {
        Some(band) => {
            tracing::debug!("Weight {} kg matched band {}", request.weight_kg, band.weight_range);
            infusion::infuse_options(band, total_dose, settings.diluent_volume_ml)?
        }
        None => {
            tracing::warn!(
                "Weight {} kg matches no weight band for {}; no infusion options",
                request.weight_kg,
                drug.name
            );
            Vec::new()
        }
    };

    Ok(DosingReport {
        drug: drug.name.clone(),
        weight_kg: request.weight_kg,
        normalized_dose,
        unit: drug.unit,
        dose_range: drug.dosing_range,
        out_of_range_warning: !check.in_range,
        warning_message: check.message,
        results,
    })
}

/// Whether the total-dose step should lift a per-minute rate to per-hour
///
/// Keyed on the caller's input unit being mcg/kg/min. Skipped when the unit
/// converter has already moved the dose to an hourly rate, so the ×60 is
/// applied once in either mode.
fn is_per_minute_rate(input: DoseUnit, canonical: DoseUnit, policy: UnitPolicy) -> bool {
    input == DoseUnit::McgPerKgPerMin && !units::lifts_to_hourly(input, canonical, policy)
}

fn check_request(request: &DosingRequest) -> Result<()> {
    if !request.weight_kg.is_finite() || request.weight_kg <= 0.0 {
        return Err(Error::InvalidRequest(format!(
            "weight must be a positive number of kg, got {}",
            request.weight_kg
        )));
    }
    if !request.dose.is_finite() || request.dose < 0.0 {
        return Err(Error::InvalidRequest(format!(
            "dose must be a non-negative number, got {}",
            request.dose
        )));
    }
    Ok(())
}
