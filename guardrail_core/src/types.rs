//! Core domain types for the infusion guardrail system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Dose units and weight bands
//! - Drug profiles and the catalog that holds them
//! - Per-request inputs and outputs
//! - Calculation settings (diluent volume, compatibility policies)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Units
// ============================================================================

/// Dosing-rate unit
///
/// The closed set of units the catalog and callers use. Both the short
/// (`hr`) and long (`hour`) spellings parse to the same variant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DoseUnit {
    #[serde(rename = "mcg/kg/min")]
    McgPerKgPerMin,
    #[serde(rename = "mcg/kg/hr", alias = "mcg/kg/hour")]
    McgPerKgPerHour,
    #[serde(rename = "ng/kg/min")]
    NgPerKgPerMin,
    #[serde(rename = "mg/kg/hr", alias = "mg/kg/hour")]
    MgPerKgPerHour,
}

impl DoseUnit {
    pub const ALL: [DoseUnit; 4] = [
        DoseUnit::McgPerKgPerMin,
        DoseUnit::McgPerKgPerHour,
        DoseUnit::NgPerKgPerMin,
        DoseUnit::MgPerKgPerHour,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DoseUnit::McgPerKgPerMin => "mcg/kg/min",
            DoseUnit::McgPerKgPerHour => "mcg/kg/hr",
            DoseUnit::NgPerKgPerMin => "ng/kg/min",
            DoseUnit::MgPerKgPerHour => "mg/kg/hr",
        }
    }

    /// Whether the rate is expressed per minute (as opposed to per hour)
    pub fn is_per_minute(&self) -> bool {
        matches!(self, DoseUnit::McgPerKgPerMin | DoseUnit::NgPerKgPerMin)
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseUnit {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcg/kg/min" => Ok(DoseUnit::McgPerKgPerMin),
            "mcg/kg/hr" | "mcg/kg/hour" => Ok(DoseUnit::McgPerKgPerHour),
            "ng/kg/min" => Ok(DoseUnit::NgPerKgPerMin),
            "mg/kg/hr" | "mg/kg/hour" => Ok(DoseUnit::MgPerKgPerHour),
            _ => Err(crate::Error::UnknownUnit(s.to_string())),
        }
    }
}

// ============================================================================
// Drug Profiles
// ============================================================================

/// Neonatal weight category used to pick concentration presets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeightBand {
    #[serde(rename = "<1kg")]
    UnderOneKg,
    #[serde(rename = "1-2.4kg")]
    OneToTwoPointFourKg,
    #[serde(rename = ">2.5kg")]
    OverTwoPointFiveKg,
}

impl WeightBand {
    pub const ALL: [WeightBand; 3] = [
        WeightBand::UnderOneKg,
        WeightBand::OneToTwoPointFourKg,
        WeightBand::OverTwoPointFiveKg,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WeightBand::UnderOneKg => "<1kg",
            WeightBand::OneToTwoPointFourKg => "1-2.4kg",
            WeightBand::OverTwoPointFiveKg => ">2.5kg",
        }
    }
}

impl fmt::Display for WeightBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepted dose envelope, in the drug's canonical unit
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DosingRange {
    pub min: f64,
    pub max: f64,
}

impl DosingRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, dose: f64) -> bool {
        dose >= self.min && dose <= self.max
    }
}

/// Concentration presets approved for one weight band
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConcentrationBand {
    pub weight_range: WeightBand,
    pub dose_options: Vec<f64>,
}

/// Guardrail entry for a single drug
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugProfile {
    pub name: String,
    pub unit: DoseUnit,
    /// `None` means no validated range (informational only)
    #[serde(default)]
    pub dosing_range: Option<DosingRange>,
    pub concentrations: Vec<ConcentrationBand>,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The complete set of drug guardrails, keyed by drug name
#[derive(Clone, Debug)]
pub struct Catalog {
    pub drugs: HashMap<String, DrugProfile>,
}

// ============================================================================
// Calculation Settings
// ============================================================================

/// How unit pairs without a conversion rule are handled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnitPolicy {
    /// Reject the pair with [`crate::Error::UnsupportedConversion`]
    #[default]
    Strict,
    /// Pass the dose through unchanged, including mcg/kg/min input for a
    /// mcg/kg/hr drug (the per-minute lift then happens in the total dose)
    Passthrough,
}

/// How weights between 2.4 and 2.5 kg are banded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BandPolicy {
    /// The upper band starts right after 2.4 kg
    #[default]
    Contiguous,
    /// The upper band starts above 2.5 kg; (2.4, 2.5] matches nothing
    LegacyGap,
}

/// Runtime parameters for the calculation engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalculationSettings {
    pub diluent_volume_ml: f64,
    pub unit_policy: UnitPolicy,
    pub band_policy: BandPolicy,
}

pub const DEFAULT_DILUENT_VOLUME_ML: f64 = 25.0;

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            diluent_volume_ml: DEFAULT_DILUENT_VOLUME_ML,
            unit_policy: UnitPolicy::default(),
            band_policy: BandPolicy::default(),
        }
    }
}

impl CalculationSettings {
    /// Settings that reproduce the legacy calculator's output
    ///
    /// Unconvertible unit pairs and mcg/kg/min input for hourly drugs pass
    /// through unconverted, and weights in (2.4, 2.5] kg match no band.
    pub fn legacy() -> Self {
        Self {
            unit_policy: UnitPolicy::Passthrough,
            band_policy: BandPolicy::LegacyGap,
            ..Self::default()
        }
    }
}

// ============================================================================
// Request and Result Types
// ============================================================================

/// A single dosing question from a caller
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DosingRequest {
    pub drug: String,
    pub weight_kg: f64,
    pub dose: f64,
    pub dose_unit: String,
}

/// Infusion parameters for one concentration preset
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct InfusionResult {
    pub concentration: f64,
    pub total_volume_ml: f64,
    pub hourly_rate_ml: f64,
}

impl InfusionResult {
    /// Copy with volumes rounded to 2 decimal places, for display
    pub fn rounded(&self) -> Self {
        Self {
            concentration: self.concentration,
            total_volume_ml: round2(self.total_volume_ml),
            hourly_rate_ml: round2(self.hourly_rate_ml),
        }
    }
}

/// Outcome of checking a dose against a drug's range
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoseCheck {
    pub in_range: bool,
    pub message: String,
}

/// Full answer to a [`DosingRequest`]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DosingReport {
    pub drug: String,
    pub weight_kg: f64,
    pub normalized_dose: f64,
    pub unit: DoseUnit,
    pub dose_range: Option<DosingRange>,
    pub out_of_range_warning: bool,
    pub warning_message: String,
    pub results: Vec<InfusionResult>,
}

/// Caller-facing failure payload
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub error: String,
}

impl From<&crate::Error> for ErrorReport {
    fn from(err: &crate::Error) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
