use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use ndarray::{Array2, ArrayView2};
use ndarray_npy::{ReadNpyError, ReadNpyExt, ViewNpyExt};

use crate::input::InputError;

/// Raw per-view network output, `(rows, num_views * (num_classes + 1))`.
/// Little-endian f32 files are viewed in place through the mapping;
/// anything else (f64, big-endian, fortran order) is read into memory.
#[derive(Debug)]
pub enum LogitStore {
    Mapped(Mmap),
    Owned(Array2<f32>),
}

#[derive(Debug)]
pub struct Logits {
    pub path: PathBuf,
    store: LogitStore,
}

impl Logits {
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let viewed = ArrayView2::<f32>::view_npy(&mmap[..]).map(|view| view.dim());
        match viewed {
            Ok(dim) => {
                tracing::debug!(
                    "memory-mapped logits {} with shape {:?}",
                    path.display(),
                    dim
                );
                return Ok(Self {
                    path: path.to_path_buf(),
                    store: LogitStore::Mapped(mmap),
                });
            }
            Err(err) => {
                tracing::debug!(
                    "cannot view {} in place ({err}); reading into memory",
                    path.display()
                );
            }
        }
        drop(mmap);

        let owned = read_f32_matrix(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            store: LogitStore::Owned(owned),
        })
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.store, LogitStore::Mapped(_))
    }

    pub fn view(&self) -> Result<ArrayView2<'_, f32>, InputError> {
        match &self.store {
            LogitStore::Mapped(mmap) => {
                ArrayView2::<f32>::view_npy(&mmap[..]).map_err(|e| {
                    InputError::InvalidInput(format!(
                        "logits {} changed while mapped: {e}",
                        self.path.display()
                    ))
                })
            }
            LogitStore::Owned(array) => Ok(array.view()),
        }
    }
}

fn read_f32_matrix(path: &Path) -> Result<Array2<f32>, InputError> {
    let as_f32 = Array2::<f32>::read_npy(BufReader::new(File::open(path)?));
    match as_f32 {
        Ok(array) => Ok(array),
        Err(first) => {
            let as_f64 = Array2::<f64>::read_npy(BufReader::new(File::open(path)?));
            match as_f64 {
                Ok(array) => Ok(array.mapv(|v| v as f32)),
                Err(_) => Err(npy_error(path, first)),
            }
        }
    }
}

/// Reads a viewpoint candidate table stored as a 2-D integer `.npy`
/// (int64 as written by numpy by default, or int32).
pub fn read_candidate_table(path: &Path) -> Result<Array2<i64>, InputError> {
    if !path.is_file() {
        return Err(InputError::MissingInput(format!(
            "viewpoint candidate table {}",
            path.display()
        )));
    }
    let as_i64 = Array2::<i64>::read_npy(BufReader::new(File::open(path)?));
    match as_i64 {
        Ok(array) => Ok(array),
        Err(first) => {
            let as_i32 = Array2::<i32>::read_npy(BufReader::new(File::open(path)?));
            match as_i32 {
                Ok(array) => Ok(array.mapv(i64::from)),
                Err(_) => Err(npy_error(path, first)),
            }
        }
    }
}

fn npy_error(path: &Path, source: ReadNpyError) -> InputError {
    InputError::Npy {
        path: path.to_path_buf(),
        source,
    }
}
