use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::ReadNpyError;
use thiserror::Error;

pub mod gz;
pub mod npy;
pub mod object_id;
pub mod samples;

use gz::find_plain_or_gz;
use npy::{Logits, read_candidate_table};
use samples::{Sample, parse_class_names, parse_samples};

pub const LOGITS_FILE: &str = "logits.npy";
pub const SAMPLES_FILE: &str = "samples.tsv";
pub const CLASSES_FILE: &str = "classes.txt";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode {}: {source}", path.display())]
    Npy {
        path: PathBuf,
        #[source]
        source: ReadNpyError,
    },
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Everything the evaluator reads from disk for one split.
#[derive(Debug)]
pub struct InputBundle {
    pub split_dir: PathBuf,
    pub samples_path: PathBuf,
    pub samples: Vec<Sample>,
    pub logits: Logits,
    pub class_names: Option<Vec<String>>,
    pub candidates_raw: Array2<i64>,
}

pub fn load_input(
    data_dir: &Path,
    split: &str,
    candidate_path: &Path,
) -> Result<InputBundle, InputError> {
    let split_dir = data_dir.join(split);
    if !split_dir.is_dir() {
        return Err(InputError::MissingInput(format!(
            "split directory {}",
            split_dir.display()
        )));
    }

    let logits_path = split_dir.join(LOGITS_FILE);
    if !logits_path.is_file() {
        return Err(InputError::MissingInput(format!(
            "network output {}",
            logits_path.display()
        )));
    }
    let samples_path = find_plain_or_gz(&split_dir, SAMPLES_FILE).ok_or_else(|| {
        InputError::MissingInput(format!(
            "{} (or .gz) in {}",
            SAMPLES_FILE,
            split_dir.display()
        ))
    })?;

    tracing::info!(
        "discovered input files: logits={}, samples={}, candidates={}",
        logits_path.display(),
        samples_path.display(),
        candidate_path.display()
    );

    let samples = parse_samples(&samples_path)?;
    let logits = Logits::open(&logits_path)?;
    let n_rows = logits.view()?.nrows();
    if n_rows != samples.len() {
        return Err(InputError::InvalidInput(format!(
            "{} has {} rows but {} lists {} samples",
            logits_path.display(),
            n_rows,
            samples_path.display(),
            samples.len()
        )));
    }
    tracing::info!(
        "loaded {} view rows ({})",
        n_rows,
        if logits.is_mapped() {
            "memory-mapped"
        } else {
            "in memory"
        }
    );

    let class_names = match find_plain_or_gz(data_dir, CLASSES_FILE) {
        Some(path) => Some(parse_class_names(&path)?),
        None => None,
    };

    let candidates_raw = read_candidate_table(candidate_path)?;

    Ok(InputBundle {
        split_dir,
        samples_path,
        samples,
        logits,
        class_names,
        candidates_raw,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
