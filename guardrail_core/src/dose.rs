//! 24-hour total dose calculation.

/// Length of one infusion syringe period
pub const INFUSION_HOURS: f64 = 24.0;

const MINUTES_PER_HOUR: f64 = 60.0;

/// Cumulative drug mass delivered over [`INFUSION_HOURS`]
///
/// `dose` is a per-kg rate; per-minute rates are lifted to per-hour first.
pub fn total_dose(dose: f64, weight_kg: f64, is_per_minute_rate: bool) -> f64 {
    let hourly = if is_per_minute_rate {
        dose * MINUTES_PER_HOUR
    } else {
        dose
    };
    hourly * weight_kg * INFUSION_HOURS
}
