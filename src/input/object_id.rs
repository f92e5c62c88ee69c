use std::path::Path;

use crate::input::InputError;

/// Object identifier for a rendered view: the file name up to its first
/// `.`, minus the trailing `suffix_len` characters that number the view
/// (`.../chair_0944_001.png` with 4 gives `chair_0944`).
pub fn object_id_from_path(path: &str, suffix_len: usize) -> Result<String, InputError> {
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| InputError::InvalidInput(format!("path {:?} has no file name", path)))?;
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let n_chars = stem.chars().count();
    if n_chars <= suffix_len {
        return Err(InputError::InvalidInput(format!(
            "file name {:?} is too short to strip a {}-character view suffix",
            file_name, suffix_len
        )));
    }
    Ok(stem.chars().take(n_chars - suffix_len).collect())
}
