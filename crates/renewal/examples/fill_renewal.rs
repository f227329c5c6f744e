//! Fill a renewal template from a JSON record
//! Run with: cargo run --example fill_renewal -- <template.pdf> <record.json> [layout.json] [output_dir]
//!
//! Steps:
//! 1. Load the record (and optional layout)
//! 2. Validate the contact stage
//! 3. Generate the filled, flattened PDF
//! 4. Write it and print the fill report
//!
//! Set RUST_LOG=renewal_form=debug to trace each step.

use anyhow::{bail, Context};
use renewal_form::{FieldOutcome, FormRecord, RenewalGenerator, RenewalLayout};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        bail!("usage: fill_renewal <template.pdf> <record.json> [layout.json] [output_dir]");
    }

    let template = PathBuf::from(&args[0]);
    let record_json = fs::read_to_string(&args[1])
        .with_context(|| format!("reading record {}", args[1]))?;
    let record = FormRecord::from_json(&record_json)?;

    let layout = match args.get(2) {
        Some(path) => {
            let json =
                fs::read_to_string(path).with_context(|| format!("reading layout {path}"))?;
            RenewalLayout::from_json(&json)?
        }
        None => RenewalLayout::default(),
    };
    let output_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("output"));

    if let Err(e) = record.validate_contact_stage() {
        // Generation still runs so the draft can be reviewed
        tracing::warn!("record is not ready to submit: {e}");
    }

    let generator = RenewalGenerator::new(layout);
    let output = generator.generate_from_path(&template, record)?;

    fs::create_dir_all(&output_dir)?;
    let path = output_dir.join(&output.file_name);
    fs::write(&path, &output.bytes)?;
    println!(
        "Saved {} ({} bytes, {})",
        path.display(),
        output.bytes.len(),
        output.mime_type
    );

    let report = &output.report;
    for field in &report.fields {
        match &field.outcome {
            FieldOutcome::Written => println!("  {:<20} written", field.field),
            FieldOutcome::Skipped { reason } => println!("  {:<20} skipped: {reason}", field.field),
        }
    }
    println!("Slashes: {:?}", report.slashes);
    println!("Signature: {:?}", report.signature);
    println!("Appended pages: {}", report.appended_pages);
    for warning in &report.warnings {
        println!("Warning: {warning}");
    }

    Ok(())
}
