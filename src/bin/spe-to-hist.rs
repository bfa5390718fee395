//! Converts `.Spe` records into tab separated histograms named after the file title.

use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, Result};
use indicatif::ProgressStyle;

use stabiliser_analysis::{
    get_files_by_pattern,
    source::SpeFile,
    workspace::ensure_out_dir,
};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Glob pattern of .Spe files
    pub input: String,
    /// Directory the histograms are written to
    pub out_dir: PathBuf,
    /// Skip paths containing any of these substrings
    #[clap(short, long)]
    pub exclude: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let files = get_files_by_pattern(&args.input, &args.exclude)?;
    if files.is_empty() {
        return Err(eyre!("no files match {}", args.input));
    }
    let out_dir = ensure_out_dir(&args.out_dir)?;

    let pb = indicatif::ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::with_template("[{elapsed_precise}] {bar} {pos:>7}/{len:7} {msg}")?);

    for filepath in &files {
        let spe = SpeFile::open(filepath)?;
        let hist = spe.to_histogram();

        let mut content = format!(
            "# {}\trun_time={}s\tcounts={}\n",
            spe.timestamp(),
            spe.run_time(),
            hist.total()
        );
        content.push_str(&hist.to_csv('\t'));

        let out = out_dir.join(format!("{}.tsv", spe.title()));
        std::fs::write(&out, content)?;
        log::debug!("{filepath:?} -> {out:?}");
        pb.inc(1);
    }
    pb.finish();

    log::info!("converted {} files into {out_dir:?}", files.len());
    Ok(())
}
