//! Dose range checking.
//!
//! A dose outside the accepted range is a warning, not an error: the infusion
//! math is still produced so the prescriber can see what the dose implies.

use crate::{DoseCheck, DoseUnit, DosingRange};

/// Check a normalized dose against a drug's accepted range
///
/// A missing range (e.g. insulin) always reports in range.
pub fn validate_dose(dose: f64, range: Option<&DosingRange>, unit: DoseUnit) -> DoseCheck {
    let Some(range) = range else {
        return DoseCheck {
            in_range: true,
            message: String::new(),
        };
    };

    if range.contains(dose) {
        DoseCheck {
            in_range: true,
            message: String::new(),
        }
    } else {
        let message = format!(
            "The dose is out of the accepted range ({} - {} {}).",
            range.min, range.max, unit
        );
        tracing::warn!("{} Requested: {} {}", message, dose, unit);
        DoseCheck {
            in_range: false,
            message,
        }
    }
}
