//! Default guardrail catalog of neonatal infusion drugs.
//!
//! This module provides the built-in drug profiles plus lookup, validation
//! and loading of site-specific catalogs from TOML.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Cached default catalog - built once and shared read-only for the process
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog with the built-in drug profiles
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

/// Adds one drug with its three weight-band option lists, in band order
fn insert_drug(
    drugs: &mut HashMap<String, DrugProfile>,
    name: &str,
    dosing_range: Option<(f64, f64)>,
    unit: DoseUnit,
    options: [&[f64]; 3],
) {
    let concentrations = WeightBand::ALL
        .iter()
        .zip(options)
        .map(|(band, opts)| ConcentrationBand {
            weight_range: *band,
            dose_options: opts.to_vec(),
        })
        .collect();

    drugs.insert(
        name.into(),
        DrugProfile {
            name: name.into(),
            dosing_range: dosing_range.map(|(min, max)| DosingRange::new(min, max)),
            unit,
            concentrations,
        },
    );
}

fn build_default_catalog_internal() -> Catalog {
    use DoseUnit::*;

    let mut drugs = HashMap::new();

    // ========================================================================
    // Inotropes / vasopressors
    // ========================================================================

    insert_drug(
        &mut drugs,
        "Adrenaline",
        Some((0.05, 1.5)),
        McgPerKgPerMin,
        [&[0.25, 1.25], &[0.75, 3.0], &[1.25, 5.0]],
    );
    insert_drug(
        &mut drugs,
        "Dobutamine",
        Some((5.0, 40.0)),
        McgPerKgPerMin,
        [&[25.0, 100.0], &[75.0, 150.0], &[100.0, 150.0]],
    );
    insert_drug(
        &mut drugs,
        "Dopamine",
        Some((7.5, 20.0)),
        McgPerKgPerMin,
        [&[10.0, 50.0], &[25.0, 100.0], &[75.0, 200.0]],
    );
    insert_drug(
        &mut drugs,
        "Noradrenaline",
        Some((0.1, 1.5)),
        McgPerKgPerMin,
        [&[0.3, 3.0], &[0.6, 3.0], &[1.2, 6.0]],
    );

    // ========================================================================
    // Sedation / analgesia
    // ========================================================================

    insert_drug(
        &mut drugs,
        "Midazolam low",
        Some((30.0, 120.0)),
        McgPerKgPerHour,
        [&[0.75, 3.0], &[1.0, 4.0], &[1.5, 4.5]],
    );
    insert_drug(
        &mut drugs,
        "Midazolam high",
        Some((120.0, 300.0)),
        McgPerKgPerHour,
        [&[2.0, 5.0], &[4.0, 12.0], &[8.0, 20.0]],
    );
    insert_drug(
        &mut drugs,
        "Morphine",
        Some((10.0, 40.0)),
        McgPerKgPerHour,
        [&[0.5, 1.5], &[1.0, 5.0], &[2.5, 7.5]],
    );

    // ========================================================================
    // Vasodilators
    // ========================================================================

    // Upper-band presets mix strengths as in the source protocol sheet
    insert_drug(
        &mut drugs,
        "Prostaglandin",
        Some((5.0, 100.0)),
        NgPerKgPerMin,
        [&[25.0, 200.0], &[50.0, 0.3], &[75.0, 0.5]],
    );
    insert_drug(
        &mut drugs,
        "Tolazoline (PPHN)",
        Some((0.25, 2.0)),
        MgPerKgPerHour,
        [&[50.0, 100.0], &[100.0, 200.0], &[150.0, 300.0]],
    );

    // ========================================================================
    // Neuromuscular blockers
    // ========================================================================

    insert_drug(
        &mut drugs,
        "Vecuronium",
        Some((1.0, 1.0)),
        McgPerKgPerMin,
        [&[1.5], &[4.0], &[7.5]],
    );
    insert_drug(
        &mut drugs,
        "Rocuronium",
        Some((300.0, 600.0)),
        McgPerKgPerHour,
        [&[20.0], &[35.0], &[75.0]],
    );

    // ========================================================================
    // Metabolic
    // ========================================================================

    // No validated range; titrated to glucose
    insert_drug(
        &mut drugs,
        "Insulin",
        None,
        McgPerKgPerHour,
        [&[5.0, 15.0], &[10.0, 25.0], &[20.0, 50.0]],
    );

    Catalog { drugs }
}

/// On-disk catalog layout: a `[[drugs]]` array of profiles
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    drugs: Vec<DrugProfile>,
}

impl Catalog {
    /// Look up a drug by its exact catalog name
    pub fn lookup(&self, name: &str) -> Result<&DrugProfile> {
        self.drugs
            .get(name)
            .ok_or_else(|| Error::UnknownDrug(name.to_string()))
    }

    /// Drug names in sorted order
    pub fn drug_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drugs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a catalog from a list of profiles, rejecting duplicate names
    pub fn from_profiles(profiles: Vec<DrugProfile>) -> Result<Self> {
        let mut drugs = HashMap::with_capacity(profiles.len());
        for profile in profiles {
            let name = profile.name.clone();
            if drugs.insert(name.clone(), profile).is_some() {
                return Err(Error::CatalogValidation(format!(
                    "Duplicate drug '{}'",
                    name
                )));
            }
        }
        Ok(Self { drugs })
    }

    /// Load and validate a catalog from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&contents)?;
        let catalog = Self::from_profiles(file.drugs)?;

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }

        tracing::info!(
            "Loaded catalog with {} drugs from {:?}",
            catalog.drugs.len(),
            path
        );
        Ok(catalog)
    }

    /// Serialize the catalog to TOML, in sorted drug order
    pub fn to_toml(&self) -> Result<String> {
        let mut drugs: Vec<DrugProfile> = self.drugs.values().cloned().collect();
        drugs.sort_by(|a, b| a.name.cmp(&b.name));

        toml::to_string_pretty(&CatalogFile { drugs })
            .map_err(|e| Error::CatalogValidation(format!("Failed to serialize catalog: {}", e)))
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.drugs.is_empty() {
            errors.push("Catalog has no drugs".to_string());
        }

        for (name, drug) in &self.drugs {
            if name.is_empty() || drug.name.is_empty() {
                errors.push("Drug has empty name".to_string());
            }
            if name != &drug.name {
                errors.push(format!(
                    "Drug key '{}' doesn't match profile name '{}'",
                    name, drug.name
                ));
            }

            if let Some(range) = drug.dosing_range {
                if !range.min.is_finite() || !range.max.is_finite() {
                    errors.push(format!("Drug '{}': dosing range is not finite", name));
                } else if range.min > range.max {
                    errors.push(format!(
                        "Drug '{}': range min {} > max {}",
                        name, range.min, range.max
                    ));
                }
            }

            if drug.concentrations.len() != WeightBand::ALL.len() {
                errors.push(format!(
                    "Drug '{}': expected {} weight bands, found {}",
                    name,
                    WeightBand::ALL.len(),
                    drug.concentrations.len()
                ));
            }

            for band in WeightBand::ALL {
                let count = drug
                    .concentrations
                    .iter()
                    .filter(|c| c.weight_range == band)
                    .count();
                if count != 1 {
                    errors.push(format!(
                        "Drug '{}': weight band {} appears {} times",
                        name, band, count
                    ));
                }
            }

            for conc in &drug.concentrations {
                if conc.dose_options.is_empty() {
                    errors.push(format!(
                        "Drug '{}': band {} has no dose options",
                        name, conc.weight_range
                    ));
                }
                for option in &conc.dose_options {
                    if !option.is_finite() || *option <= 0.0 {
                        errors.push(format!(
                            "Drug '{}': band {} has non-positive concentration {}",
                            name, conc.weight_range, option
                        ));
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.drugs.len(), 12);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_lookup_every_declared_drug() {
        let catalog = get_default_catalog();
        for name in catalog.drug_names() {
            let drug = catalog.lookup(name).unwrap();
            assert_eq!(drug.name, name);
        }
    }

    #[test]
    fn test_lookup_unknown_drug() {
        let catalog = get_default_catalog();
        let err = catalog.lookup("Caffeine").unwrap_err();
        assert!(matches!(err, Error::UnknownDrug(ref name) if name == "Caffeine"));
        assert_eq!(err.to_string(), "Drug not found in database");

        // Exact-key lookup only
        assert!(catalog.lookup("adrenaline").is_err());
    }

    #[test]
    fn test_insulin_is_unbounded() {
        let insulin = get_default_catalog().lookup("Insulin").unwrap();
        assert!(insulin.dosing_range.is_none());
        assert_eq!(insulin.unit, DoseUnit::McgPerKgPerHour);
    }

    #[test]
    fn test_bands_declared_in_order() {
        let adrenaline = get_default_catalog().lookup("Adrenaline").unwrap();
        let bands: Vec<_> = adrenaline
            .concentrations
            .iter()
            .map(|c| c.weight_range)
            .collect();
        assert_eq!(bands, WeightBand::ALL.to_vec());
        assert_eq!(adrenaline.concentrations[1].dose_options, vec![0.75, 3.0]);
    }

    #[test]
    fn test_validate_catches_bad_profiles() {
        let mut catalog = build_default_catalog();
        let drug = catalog.drugs.get_mut("Morphine").unwrap();
        drug.dosing_range = Some(DosingRange::new(40.0, 10.0));
        drug.concentrations[0].dose_options = vec![0.0];
        drug.concentrations.pop();

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("min 40 > max 10")));
        assert!(errors.iter().any(|e| e.contains("non-positive concentration 0")));
        assert!(errors.iter().any(|e| e.contains("expected 3 weight bands")));
    }

    #[test]
    fn test_from_profiles_rejects_duplicates() {
        let morphine = build_default_catalog().drugs["Morphine"].clone();
        let result = Catalog::from_profiles(vec![morphine.clone(), morphine]);
        assert!(matches!(result, Err(Error::CatalogValidation(_))));
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.toml");

        let catalog = build_default_catalog();
        std::fs::write(&path, catalog.to_toml().unwrap()).unwrap();

        let loaded = Catalog::load_from(&path).unwrap();
        assert_eq!(loaded.drugs, catalog.drugs);
    }

    #[test]
    fn test_load_site_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("site.toml");
        std::fs::write(
            &path,
            r#"
[[drugs]]
name = "Milrinone"
unit = "mcg/kg/min"
dosing_range = { min = 0.25, max = 0.75 }

[[drugs.concentrations]]
weight_range = "<1kg"
dose_options = [20.0]

[[drugs.concentrations]]
weight_range = "1-2.4kg"
dose_options = [40.0]

[[drugs.concentrations]]
weight_range = ">2.5kg"
dose_options = [60.0]
"#,
        )
        .unwrap();

        let catalog = Catalog::load_from(&path).unwrap();
        let milrinone = catalog.lookup("Milrinone").unwrap();
        assert_eq!(milrinone.dosing_range, Some(DosingRange::new(0.25, 0.75)));
        assert_eq!(milrinone.concentrations[2].weight_range, WeightBand::OverTwoPointFiveKg);
    }

    #[test]
    fn test_load_rejects_invalid_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(
            &path,
            r#"
[[drugs]]
name = "Broken"
unit = "mg/kg/hour"

[[drugs.concentrations]]
weight_range = "<1kg"
dose_options = []
"#,
        )
        .unwrap();

        let err = Catalog::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::CatalogValidation(_)));
    }
}
