mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;

use crate::input::load_input;
use crate::model::case::ViewpointCase;
use crate::model::config::EvalConfig;
use crate::model::rule::{PositiveClassSpec, default_exception_ids};
use crate::pipeline::stage7_report::{Stage7Input, write_reports};
use crate::pipeline::{EvalError, evaluate};

#[derive(Parser, Debug)]
#[command(
    name = "viewvote",
    version,
    about = "Evaluate multi-view pose-voting classifier output: best viewpoint candidate per object, top-k and target-class accuracy"
)]
struct Args {
    /// Dataset root holding one directory per split and an optional classes.txt.
    #[arg(long, default_value = "./ModelNet40_20")]
    data: PathBuf,
    /// Split directory under the dataset root (test, test_real, test_synthetic, ...).
    #[arg(long, default_value = "test")]
    split: String,
    /// View rows per batch; must be a multiple of the number of views.
    #[arg(short = 'b', long, default_value_t = 20)]
    batch_size: usize,
    /// Log a progress line every N batches (0 disables).
    #[arg(short = 'p', long, default_value_t = 10)]
    print_freq: usize,
    /// Viewpoint layout: 1 = 12 views, 2 = 20 views, 3 = 160 views.
    #[arg(long, value_enum, default_value_t = ViewpointCase::Dodecahedron20)]
    case: ViewpointCase,
    /// Candidate table; defaults to vcand_case<N>.npy in the working directory.
    #[arg(long)]
    vcand: Option<PathBuf>,
    /// Destination of the per-object target-class scores.
    #[arg(long)]
    csv: PathBuf,
    /// Also write the final summary as JSON.
    #[arg(long)]
    summary_json: Option<PathBuf>,
    /// Positive class of the binary rule, as an index or a name from classes.txt.
    #[arg(long, default_value = "8")]
    positive_class: PositiveClassSpec,
    /// Name of the positive class in report lines.
    #[arg(long, default_value = "chair")]
    positive_label: String,
    /// Object ids never counted as positive (repeatable).
    #[arg(long = "exception")]
    exceptions: Vec<String>,
    /// Top-k accuracies to track.
    #[arg(long, value_delimiter = ',', default_value = "1,5")]
    topk: Vec<usize>,
    /// Trailing characters of the file stem that number the view.
    #[arg(long, default_value_t = 4)]
    id_suffix_len: usize,
    /// Worker threads for candidate scoring (0 = rayon default).
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> EvalConfig {
        let exception_ids: BTreeSet<String> = if self.exceptions.is_empty() {
            default_exception_ids()
        } else {
            self.exceptions.into_iter().collect()
        };
        EvalConfig {
            candidate_path: self
                .vcand
                .unwrap_or_else(|| self.case.default_table_path()),
            data_dir: self.data,
            split: self.split,
            case: self.case,
            batch_size: self.batch_size,
            print_freq: self.print_freq,
            topk: self.topk,
            id_suffix_len: self.id_suffix_len,
            positive_class: self.positive_class,
            positive_label: self.positive_label,
            exception_ids,
            csv_path: self.csv,
            summary_json: self.summary_json,
            threads: self.threads,
        }
    }
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);
    if let Err(err) = run(args.into_config()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(config: EvalConfig) -> Result<(), EvalError> {
    tracing::info!(
        "evaluating {} (case {}, batch size {})",
        config.split_dir().display(),
        config.case.number(),
        config.batch_size
    );
    let bundle = load_input(&config.data_dir, &config.split, &config.candidate_path)?;
    let outcome = evaluate(&config, &bundle)?;
    if outcome.exporter.is_empty() {
        tracing::warn!("no objects were evaluated; {} will be empty", config.csv_path.display());
    }
    outcome.exporter.flush(&config.csv_path)?;
    write_reports(&Stage7Input {
        config: &config,
        bundle: &bundle,
        outcome: &outcome,
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
