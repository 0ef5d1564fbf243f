use anyhow::Context;
use clap::Parser;
use dispcore::units::Frequency;
use dispcore::DispersionMeasure;
use std::fs;
use std::path::PathBuf;
use workflow::config::{default_dm, FilterKind, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Disperse and dedisperse a synthetic giant pulse")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Dispersion measure, e.g. "1270.9 pc/cm3"
    #[arg(long)]
    dm: Option<DispersionMeasure>,
    /// Reference frequency, e.g. "300 MHz"; the band centre when absent
    #[arg(long)]
    reference_frequency: Option<Frequency>,
    /// Filter stages applied in order
    #[arg(long, value_enum, value_delimiter = ',')]
    chain: Vec<FilterKind>,
    /// Write the run summary as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        let mut config = WorkflowConfig::load(path)?;
        config.apply_overrides(args.dm, args.reference_frequency, args.chain);
        config
    } else {
        let dm = match args.dm {
            Some(dm) => dm,
            None => default_dm()?,
        };
        WorkflowConfig::from_args(dm, args.reference_frequency, args.chain)
    };

    let runner = Runner::new(workflow_config);
    let result = runner.execute()?;

    println!(
        "Chain {:?} at {} -> start {}, {} samples per frame, peak bins {:?}, peak fractions {:?}",
        result.chain,
        result.dm,
        result.start_time,
        result.samples_per_frame,
        result.peak_bins,
        result.peak_fraction
    );

    if let Some(report_path) = args.report {
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let report = serde_json::to_string_pretty(&result).context("serializing workflow result")?;
        fs::write(&report_path, report)
            .with_context(|| format!("writing report {}", report_path.display()))?;
    }

    Ok(())
}
