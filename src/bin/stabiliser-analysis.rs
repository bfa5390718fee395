//! Endpoint drift analysis of stabiliser loaded samples.
//!
//! Reads every spectrum matching the input pattern, estimates its endpoint and
//! writes stacked spectra, the endpoint vs time plot and summary tables.

use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use clap::Parser;
use eyre::{bail, eyre, Result};
use indicatif::ProgressStyle;

use stabiliser_analysis::{
    aggregate::TimeUnit,
    config::{InsufficientPolicy, Opts},
    get_files_by_pattern,
    labels::DisplayParams,
    load_batch,
    metadata::NamingConvention,
    render::{render_endpoints, render_spectra},
    report::write_reports,
    workspace::{ensure_out_dir, get_workspace},
};

#[cfg(target_family = "unix")]
use tikv_jemallocator::Jemalloc;
#[cfg(target_family = "unix")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Glob pattern of spectrum files (.Spe or .tsv histograms)
    pub input: Option<String>,
    /// Directory for plots and tables
    pub out_dir: Option<PathBuf>,
    /// Name of the stabiliser used in this test
    pub stabiliser: Option<String>,
    /// Percentage concentration of Te used in this test
    pub te: Option<f64>,
    /// Concentration of PPO in g/l [2]
    #[clap(short, long)]
    pub ppo: Option<f64>,
    /// Path to a config file in yaml format, command line values take precedence
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    #[clap(long, value_enum)]
    pub convention: Option<NamingConvention>,
    /// Tail counts used for the endpoint estimate
    #[clap(long)]
    pub tail_budget: Option<u64>,
    #[clap(long, value_enum)]
    pub on_insufficient: Option<InsufficientPolicy>,
    #[clap(long, value_enum)]
    pub time_unit: Option<TimeUnit>,
    /// Create the output directory without asking
    #[clap(short, long)]
    pub yes: bool,
}

fn build_opts(args: Args) -> Result<Opts> {
    let mut opts = match &args.config {
        Some(path) => Opts::load(path)?,
        None => {
            let (Some(input), Some(stabiliser), Some(te)) =
                (args.input.clone(), args.stabiliser.clone(), args.te)
            else {
                bail!("input, stabiliser and te are required when no --config is given");
            };
            Opts {
                input,
                exclude: vec![],
                out_dir: get_workspace(),
                display: DisplayParams {
                    stabiliser,
                    te,
                    ppo: args.ppo.unwrap_or(stabiliser_analysis::labels::DEFAULT_PPO),
                },
                convention: NamingConvention::default(),
                tail_budget: stabiliser_analysis::endpoint::DEFAULT_TAIL_BUDGET,
                on_insufficient: InsufficientPolicy::default(),
                time_unit: TimeUnit::default(),
            }
        }
    };

    if let Some(input) = args.input {
        opts.input = input;
    }
    if let Some(out_dir) = args.out_dir {
        opts.out_dir = out_dir;
    }
    if let Some(stabiliser) = args.stabiliser {
        opts.display.stabiliser = stabiliser;
    }
    if let Some(te) = args.te {
        opts.display.te = te;
    }
    if let Some(ppo) = args.ppo {
        opts.display.ppo = ppo;
    }
    if let Some(convention) = args.convention {
        opts.convention = convention;
    }
    if let Some(tail_budget) = args.tail_budget {
        opts.tail_budget = tail_budget;
    }
    if let Some(on_insufficient) = args.on_insufficient {
        opts.on_insufficient = on_insufficient;
    }
    if let Some(time_unit) = args.time_unit {
        opts.time_unit = time_unit;
    }
    Ok(opts)
}

fn confirm_out_dir(dir: &Path, yes: bool) -> Result<PathBuf> {
    if !dir.is_dir() && !yes {
        print!("Would you like to generate requested directory {dir:?} [Y/n]: ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim(), "" | "y" | "Y") {
            bail!("output directory {dir:?} does not exist");
        }
    }
    Ok(ensure_out_dir(dir)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let yes = args.yes;
    let opts = build_opts(args)?;

    let files = get_files_by_pattern(&opts.input, &opts.exclude)?;
    if files.is_empty() {
        return Err(eyre!("no files match {}", opts.input));
    }
    log::info!("found {} spectrum files", files.len());

    let out_dir = confirm_out_dir(&opts.out_dir, yes)?;

    let pb = indicatif::ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::with_template("[{elapsed_precise}] {bar} {pos:>7}/{len:7} {msg}")?);

    let batch = load_batch(&files, &opts.pipeline(), &pb)?;

    let spectra = render_spectra(&batch, &opts.display, &out_dir)?;
    log::info!("wrote {} spectrum plots", spectra.len());

    let endpoints = render_endpoints(&batch, &opts.display, opts.time_unit, &out_dir)?;
    log::info!("wrote {endpoints:?}");

    let summary = write_reports(&batch, opts.time_unit, &out_dir)?;
    for (identifier, entry) in &summary.identifiers {
        match entry.drift {
            Some(drift) => log::info!(
                "{identifier}: {} points, drift {:.3} per {:?}",
                entry.points.len(),
                drift.slope,
                opts.time_unit
            ),
            None => log::info!("{identifier}: {} points", entry.points.len()),
        }
    }

    Ok(())
}
