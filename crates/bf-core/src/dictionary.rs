use std::path::Path;

use crate::EngineError;

/// Loads a dictionary file: UTF-8 text, one entry per line, `#` comments,
/// surrounding whitespace stripped, blank lines skipped. Order is
/// preserved; de-duplication is the Builder's job, not the loader's.
pub fn load_dictionary_file(path: impl AsRef<Path>) -> Result<Vec<String>, EngineError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| EngineError::DictionaryLoad {
        path: path.display().to_string(),
        source,
    })?;

    Ok(raw
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.txt");
        std::fs::write(&path, "admin\n# a comment\n\n  root  \nadmin\n").unwrap();

        let entries = load_dictionary_file(&path).unwrap();
        assert_eq!(entries, vec!["admin", "root", "admin"]);
    }

    #[test]
    fn missing_file_is_dictionary_load_error() {
        let err = load_dictionary_file("/no/such/file/should/exist.txt").unwrap_err();
        assert!(matches!(err, EngineError::DictionaryLoad { .. }));
    }
}
