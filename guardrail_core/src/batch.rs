//! Batch calculation over CSV files.
//!
//! Each input row is one [`DosingRequest`]. Each output row is one infusion
//! option. A failed request still produces a row, with the `error` column set.

use crate::{engine, CalculationSettings, Catalog, DosingRequest, Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchRow {
    pub drug: String,
    pub weight_kg: f64,
    pub normalized_dose: Option<f64>,
    pub unit: Option<String>,
    pub out_of_range_warning: Option<bool>,
    pub concentration: Option<f64>,
    pub total_volume_ml: Option<f64>,
    pub hourly_rate_ml: Option<f64>,
    pub error: Option<String>,
}

/// Run one request and flatten it into output rows
///
/// A successful request with no matching band yields a single row without
/// infusion columns.
pub fn rows_for_request(
    catalog: &Catalog,
    request: &DosingRequest,
    settings: &CalculationSettings,
) -> Vec<BatchRow> {
    let report = match engine::calculate(catalog, request, settings) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("Batch request for {:?} failed: {}", request.drug, e);
            return vec![BatchRow {
                drug: request.drug.clone(),
                weight_kg: request.weight_kg,
                error: Some(e.to_string()),
                ..BatchRow::default()
            }];
        }
    };

    let base = || BatchRow {
        drug: report.drug.clone(),
        weight_kg: report.weight_kg,
        normalized_dose: Some(report.normalized_dose),
        unit: Some(report.unit.to_string()),
        out_of_range_warning: Some(report.out_of_range_warning),
        ..BatchRow::default()
    };

    if report.results.is_empty() {
        return vec![base()];
    }

    report
        .results
        .iter()
        .map(|r| {
            let r = r.rounded();
            BatchRow {
                concentration: Some(r.concentration),
                total_volume_ml: Some(r.total_volume_ml),
                hourly_rate_ml: Some(r.hourly_rate_ml),
                ..base()
            }
        })
        .collect()
}

/// Calculate every request in `input_path` and write results to `output_path`
///
/// Rows are written to a temporary file next to `output_path` and moved into
/// place only once the whole input has been read. A malformed input leaves an
/// existing output file untouched. Returns the number of requests processed.
pub fn run_batch(
    catalog: &Catalog,
    settings: &CalculationSettings,
    input_path: &Path,
    output_path: &Path,
) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(input_path)?;

    // Ensure parent directory exists
    let parent = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut writer = csv::Writer::from_writer(NamedTempFile::new_in(parent)?);

    let mut count = 0;
    for record in reader.deserialize() {
        let request: DosingRequest = record?;
        for row in rows_for_request(catalog, &request, settings) {
            writer.serialize(row)?;
        }
        count += 1;
    }

    writer.flush()?;
    let temp = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(e.error().kind(), e.to_string()))?;
    temp.as_file().sync_all()?;
    temp.persist(output_path).map_err(|e| Error::Io(e.error))?;
    tracing::info!("Wrote results for {} requests to {:?}", count, output_path);

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::get_default_catalog;

    fn read_rows(path: &Path) -> Vec<BatchRow> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_batch_writes_one_row_per_option() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("requests.csv");
        let output = temp_dir.path().join("out").join("results.csv");

        std::fs::write(
            &input,
            "drug,weight_kg,dose,dose_unit\n\
             Adrenaline,2,0.5,mcg/kg/min\n\
             Vecuronium,0.8,1,mcg/kg/min\n",
        )
        .unwrap();

        let count = run_batch(
            get_default_catalog(),
            &CalculationSettings::default(),
            &input,
            &output,
        )
        .unwrap();
        assert_eq!(count, 2);

        let rows = read_rows(&output);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].drug, "Adrenaline");
        assert_eq!(rows[0].total_volume_ml, Some(76.8));
        assert_eq!(rows[0].hourly_rate_ml, Some(3.2));
        assert_eq!(rows[1].concentration, Some(3.0));
        assert_eq!(rows[2].drug, "Vecuronium");
        assert_eq!(rows[2].error, None);
    }

    #[test]
    fn test_batch_records_errors_and_empty_bands() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("requests.csv");
        let output = temp_dir.path().join("results.csv");

        std::fs::write(
            &input,
            "drug,weight_kg,dose,dose_unit\n\
             Caffeine,1,5,mg/kg/hr\n\
             Morphine,2.45,20,mcg/kg/hr\n",
        )
        .unwrap();

        let count = run_batch(
            get_default_catalog(),
            &CalculationSettings::legacy(),
            &input,
            &output,
        )
        .unwrap();
        assert_eq!(count, 2);

        let rows = read_rows(&output);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].error.as_deref(), Some("Drug not found in database"));
        assert_eq!(rows[0].concentration, None);
        assert_eq!(rows[1].drug, "Morphine");
        assert_eq!(rows[1].normalized_dose, Some(20.0));
        assert_eq!(rows[1].concentration, None);
    }

    #[test]
    fn test_malformed_input_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("requests.csv");
        let output = temp_dir.path().join("results.csv");
        std::fs::write(&input, "drug,weight_kg,dose,dose_unit\nAdrenaline,heavy,0.5,mcg/kg/min\n")
            .unwrap();

        let result = run_batch(
            get_default_catalog(),
            &CalculationSettings::default(),
            &input,
            &output,
        );
        assert!(matches!(result, Err(crate::Error::Csv(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_failed_batch_keeps_previous_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("requests.csv");
        let output = temp_dir.path().join("results.csv");
        std::fs::write(
            &input,
            "drug,weight_kg,dose,dose_unit
             Adrenaline,2,0.5,mcg/kg/min
             Morphine,light,20,mcg/kg/hr
",
        )
        .unwrap();
        std::fs::write(&output, "previous results\n").unwrap();

        let result = run_batch(
            get_default_catalog(),
            &CalculationSettings::default(),
            &input,
            &output,
        );
        assert!(result.is_err());
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "previous results\n"
        );

        // The temporary file is cleaned up
        let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_batch_replaces_previous_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("requests.csv");
        let output = temp_dir.path().join("results.csv");
        std::fs::write(
            &input,
            "drug,weight_kg,dose,dose_unit
Vecuronium,0.8,1,mcg/kg/min
",
        )
        .unwrap();
        std::fs::write(&output, "previous results\n").unwrap();

        run_batch(
            get_default_catalog(),
            &CalculationSettings::default(),
            &input,
            &output,
        )
        .unwrap();

        let rows = read_rows(&output);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].drug, "Vecuronium");
    }
}
