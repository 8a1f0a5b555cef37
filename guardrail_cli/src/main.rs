use clap::{Parser, Subcommand};
use guardrail_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "guardrail")]
#[command(about = "Neonatal infusion guardrail calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $XDG_CONFIG_HOME/guardrail/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Site-specific catalog TOML, overriding the built-in drugs
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Reproduce the original calculator's weight gap and unit pass-through
    #[arg(long, global = true)]
    legacy: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate infusion volume and rate for one prescription
    Calc {
        /// Drug name as listed by `guardrail drugs`
        #[arg(long)]
        drug: String,

        /// Patient weight in kg
        #[arg(long)]
        weight: f64,

        /// Requested dose
        #[arg(long)]
        dose: f64,

        /// Dose unit (mcg/kg/min, mcg/kg/hr, ng/kg/min, mg/kg/hr)
        #[arg(long)]
        unit: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List drugs in the catalog
    Drugs {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Calculate every request in a CSV file
    Batch {
        /// Input CSV with columns drug,weight_kg,dose,dose_unit
        #[arg(long)]
        input: PathBuf,

        /// Output CSV, one row per infusion option
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    guardrail_core::logging::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut settings = config.settings();
    if cli.legacy {
        settings.unit_policy = UnitPolicy::Passthrough;
        settings.band_policy = BandPolicy::LegacyGap;
    }

    // Load catalog once; it is read-only from here on
    let site_catalog;
    let catalog: &Catalog = match cli.catalog.as_ref().or(config.catalog.path.as_ref()) {
        Some(path) => {
            site_catalog = Catalog::load_from(path)?;
            &site_catalog
        }
        None => get_default_catalog(),
    };

    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    tracing::debug!("Catalog ready with {} drugs", catalog.drugs.len());

    match cli.command {
        Commands::Calc {
            drug,
            weight,
            dose,
            unit,
            json,
        } => {
            let request = DosingRequest {
                drug,
                weight_kg: weight,
                dose,
                dose_unit: unit,
            };
            cmd_calc(catalog, &request, &settings, json)
        }
        Commands::Drugs { json } => cmd_drugs(catalog, json),
        Commands::Batch { input, output } => cmd_batch(catalog, &settings, input, output),
    }
}

fn cmd_calc(
    catalog: &Catalog,
    request: &DosingRequest,
    settings: &CalculationSettings,
    json: bool,
) -> Result<()> {
    let report = match calculate(catalog, request, settings) {
        Ok(report) => report,
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ErrorReport::from(&e))?);
            }
            return Err(e);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_report(&report, settings);
    }

    Ok(())
}

fn cmd_drugs(catalog: &Catalog, json: bool) -> Result<()> {
    let names = catalog.drug_names();

    if json {
        let drugs: Vec<&DrugProfile> = names.iter().map(|n| &catalog.drugs[*n]).collect();
        println!("{}", serde_json::to_string_pretty(&drugs)?);
        return Ok(());
    }

    for name in names {
        let drug = &catalog.drugs[name];
        let range = match drug.dosing_range {
            Some(r) => format!("{} - {} {}", r.min, r.max, drug.unit),
            None => format!("no validated range ({})", drug.unit),
        };
        println!("{}", drug.name);
        println!("  Range: {}", range);
        for band in &drug.concentrations {
            let options: Vec<String> = band.dose_options.iter().map(|o| o.to_string()).collect();
            println!("  {:<8} {}", band.weight_range.label(), options.join(", "));
        }
    }

    Ok(())
}

fn cmd_batch(
    catalog: &Catalog,
    settings: &CalculationSettings,
    input: PathBuf,
    output: PathBuf,
) -> Result<()> {
    let count = run_batch(catalog, settings, &input, &output)?;

    println!("✓ Calculated {} requests", count);
    println!("  CSV: {}", output.display());

    Ok(())
}

fn display_report(report: &DosingReport, settings: &CalculationSettings) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", report.drug);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Weight: {} kg", report.weight_kg);
    println!("  Dose: {} {}", report.normalized_dose, report.unit);
    match report.dose_range {
        Some(r) => println!("  Accepted range: {} - {} {}", r.min, r.max, report.unit),
        None => println!("  Accepted range: none (not validated)"),
    }

    if report.out_of_range_warning {
        println!();
        println!("  ⚠ {}", report.warning_message);
    }

    println!();
    if report.results.is_empty() {
        println!("  No concentration presets match this weight.");
        println!();
        return;
    }

    println!(
        "  Diluent {} mL, infused over 24 hours",
        settings.diluent_volume_ml
    );
    println!(
        "  {:<15} {:>18} {:>14}",
        "Concentration", "Total volume", "Hourly rate"
    );
    for result in &report.results {
        let r = result.rounded();
        println!(
            "  {:<15} {:>15.2} mL {:>9.2} mL/h",
            r.concentration, r.total_volume_ml, r.hourly_rate_ml
        );
    }
    println!();
}
