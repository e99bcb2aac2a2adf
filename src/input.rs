use std::path::Path;

use serde::Deserialize;

use crate::error::{RecoverError, Result};

/// One input record describing an account to be repaired.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryRow {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub new_email: String,
}

/// Read the whole recovery file into memory, in file order.
///
/// A missing file is fatal. Rows short of fields come back with empty
/// strings and fail account resolution later instead of aborting the run.
pub fn read_rows(path: &str) -> Result<Vec<RecoveryRow>> {
    if !Path::new(path).is_file() {
        return Err(RecoverError::Config(format!("File not found: {}", path)));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_rows_in_file_order() {
        let file = write_csv(
            "username,email,new_email\n\
             alice,alice@old.com,alice@new.com\n\
             bob,bob@old.com,bob@new.com\n",
        );

        let rows = read_rows(file.path().to_str().unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].username, "alice");
        assert_eq!(rows[0].email, "alice@old.com");
        assert_eq!(rows[0].new_email, "alice@new.com");
        assert_eq!(rows[1].username, "bob");
    }

    #[test]
    fn test_read_rows_handles_non_ascii() {
        let file = write_csv(
            "username,email,new_email\n\
             søren,søren@old.dk,søren@new.dk\n",
        );

        let rows = read_rows(file.path().to_str().unwrap()).unwrap();
        assert_eq!(rows[0].username, "søren");
        assert_eq!(rows[0].email, "søren@old.dk");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = read_rows("/no/such/file.csv").unwrap_err();
        assert!(matches!(err, RecoverError::Config(_)));
    }

    #[test]
    fn test_short_row_yields_empty_fields() {
        let file = write_csv(
            "username,email,new_email\n\
             alice,alice@old.com\n",
        );

        let rows = read_rows(file.path().to_str().unwrap()).unwrap();
        assert_eq!(rows[0].username, "alice");
        assert_eq!(rows[0].new_email, "");
    }
}
