use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialise summary: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Per-object scalar scores keyed by object id. A repeated id overwrites
/// the earlier score.
#[derive(Debug, Clone, Default)]
pub struct ScoreExporter {
    scores: BTreeMap<String, f64>,
}

impl ScoreExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, object_id: &str, score: f64) {
        if let Some(previous) = self.scores.insert(object_id.to_string(), score) {
            tracing::debug!(
                "object {} exported twice; replacing score {:?} with {:?}",
                object_id,
                previous,
                score
            );
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Writes `id,score` rows in ascending id order, without a header.
    /// Returns the number of rows written.
    pub fn flush(&self, path: &Path) -> Result<usize, ExportError> {
        let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
        let mut w = BufWriter::new(file);
        for (id, score) in &self.scores {
            writeln!(w, "{},{:?}", csv_field(id), score).map_err(|e| ExportError::io(path, e))?;
        }
        w.flush().map_err(|e| ExportError::io(path, e))?;
        tracing::info!("wrote {} object scores to {}", self.scores.len(), path.display());
        Ok(self.scores.len())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_export.rs"]
mod tests;
