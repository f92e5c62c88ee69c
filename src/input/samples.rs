use std::io::BufRead;
use std::path::Path;

use crate::input::InputError;
use crate::input::gz::open_maybe_gz;

/// One rendered view: the image path it came from and its class label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: String,
    pub label: i64,
}

pub fn parse_samples(path: &Path) -> Result<Vec<Sample>, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut samples = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 2 {
            return Err(InputError::Parse(format!(
                "samples line {} has <2 columns",
                line_no
            )));
        }
        let label_raw = cols[1].trim();
        if line_no == 1 && cols[0].trim().eq_ignore_ascii_case("path") {
            continue;
        }
        let label = label_raw.parse::<i64>().map_err(|_| {
            InputError::Parse(format!(
                "samples line {} has non-integer label {:?}",
                line_no, label_raw
            ))
        })?;
        samples.push(Sample {
            path: cols[0].trim().to_string(),
            label,
        });
    }

    if samples.is_empty() {
        return Err(InputError::Parse("samples file is empty".to_string()));
    }

    Ok(samples)
}

pub fn parse_class_names(path: &Path) -> Result<Vec<String>, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut names = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        names.push(line.to_string());
    }

    if names.is_empty() {
        return Err(InputError::Parse("class list is empty".to_string()));
    }

    Ok(names)
}
