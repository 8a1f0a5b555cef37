//! Dose unit normalization.
//!
//! Only two conversions exist:
//! - mcg/kg/min → mcg/kg/hr (×60)
//! - ng/kg/min → mcg/kg/min (÷1000)
//!
//! Identical units pass through. Anything else is rejected under
//! [`UnitPolicy::Strict`] and passed through unchanged under
//! [`UnitPolicy::Passthrough`].
//!
//! Pass-through mode also skips the mcg/kg/min → mcg/kg/hr rule. The legacy
//! catalog spelled the hourly unit `mcg/kg/hr` while the rule was keyed on
//! `mcg/kg/hour`, so it never fired there and the dose reached the range check
//! in mcg/kg/min.

use crate::{DoseUnit, Error, Result, UnitPolicy};

const MINUTES_PER_HOUR: f64 = 60.0;
const NG_PER_MCG: f64 = 1000.0;

/// Conversion factor for a unit pair that has a rule under `policy`
fn conversion_factor(from: DoseUnit, to: DoseUnit, policy: UnitPolicy) -> Option<f64> {
    match (from, to) {
        _ if from == to => Some(1.0),
        (DoseUnit::McgPerKgPerMin, DoseUnit::McgPerKgPerHour) => match policy {
            UnitPolicy::Strict => Some(MINUTES_PER_HOUR),
            UnitPolicy::Passthrough => None,
        },
        (DoseUnit::NgPerKgPerMin, DoseUnit::McgPerKgPerMin) => Some(1.0 / NG_PER_MCG),
        _ => None,
    }
}

/// Whether `from → to` has a conversion rule (identity included)
fn is_supported(from: DoseUnit, to: DoseUnit, policy: UnitPolicy) -> bool {
    conversion_factor(from, to, policy).is_some()
}

/// Whether normalizing `from → to` turns a per-minute rate into a per-hour one
pub fn lifts_to_hourly(from: DoseUnit, to: DoseUnit, policy: UnitPolicy) -> bool {
    from.is_per_minute() && !to.is_per_minute() && is_supported(from, to, policy)
}

/// Express `dose` (given in `from`) in the drug's canonical unit `to`
pub fn normalize(dose: f64, from: DoseUnit, to: DoseUnit, policy: UnitPolicy) -> Result<f64> {
    match conversion_factor(from, to, policy) {
        Some(factor) => {
            let converted = dose * factor;
            if from != to {
                tracing::debug!("Converted {} {} -> {} {}", dose, from, converted, to);
            }
            Ok(converted)
        }
        None => match policy {
            UnitPolicy::Strict => Err(Error::UnsupportedConversion { from, to }),
            UnitPolicy::Passthrough => {
                tracing::debug!("No rule for {} -> {}, passing {} through", from, to, dose);
                Ok(dose)
            }
        },
    }
}
