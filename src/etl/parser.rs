use std::fs;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Reads a delimited UTF-8 file into typed rows. The first line is the header;
 * blank lines are skipped; rows shorter than the header are padded with empty
 * fields, which deserialize to `None` for optional columns. Each row is
 * returned individually so the caller can treat a malformed row as a counted
 * skip instead of aborting the batch.
 *
 * # Arguments
 * `path`: Path to the CSV file.
 *
 * # Returns
 * A Result containing one parse result per data row, or an `ApplicationError`
 * when the file itself cannot be read.
 */
pub fn read_csv_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<Result<T, ApplicationError>>, ApplicationError> {
    let contents = read_file(path)?;
    read_csv(contents.as_bytes())
}

/**
 * Reads a JSON file containing an array of records into typed rows.
 *
 * # Arguments
 * `path`: Path to the JSON file.
 */
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ApplicationError> {
    let contents = read_file(path)?;
    serde_json::from_str(&contents).map_err(|err| ApplicationError::new(ErrorType::Parse, format!("Failed to parse JSON file {}: {err}", path.display())))
}

/**
 * Parses CSV content from any reader. Split out from the file entry point so
 * tests can parse in-memory bytes.
 */
pub(crate) fn read_csv<T: DeserializeOwned>(input: impl Read) -> Result<Vec<Result<T, ApplicationError>>, ApplicationError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(input);
    let headers = reader.headers().map_err(|err| ApplicationError::new(ErrorType::Parse, format!("Failed to read CSV header: {err}")))?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let mut record = match record {
            Ok(record) => record,
            Err(err) => {
                rows.push(Err(ApplicationError::new(ErrorType::Parse, format!("Malformed CSV record: {err}"))));
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map(|position| position.line()).unwrap_or_default();
        while record.len() < headers.len() {
            record.push_field("");
        }
        let row = record.deserialize(Some(&headers)).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Invalid row at line {line}: {err}")));
        rows.push(row);
    }
    Ok(rows)
}

/**
 * Reads a file to a string, mapping absence to `NotFound` and undecodable
 * content to `Parse`.
 */
fn read_file(path: &Path) -> Result<String, ApplicationError> {
    if !path.exists() {
        return Err(ApplicationError::new(ErrorType::NotFound, format!("Input file not found: {}", path.display())));
    }
    fs::read_to_string(path).map_err(|err| ApplicationError::new(ErrorType::Parse, format!("Failed to read input file {}: {err}", path.display())))
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        ibge_code: i64,
        name: String,
        #[serde(default)]
        party: Option<String>,
    }

    #[test]
    fn test_header_row_becomes_field_names() {
        let input = "ibge_code,name,party\n4104808,JOÃO DA SILVA,PT\n";
        let rows: Vec<Result<Row, ApplicationError>> = read_csv(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.ibge_code, 4104808);
        assert_eq!(row.party.as_deref(), Some("PT"));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let input = "ibge_code,name,party\n\n4104808,A,PT\n\n4106902,B,PSD\n";
        let rows: Vec<Result<Row, ApplicationError>> = read_csv(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_short_row_padded_with_null() {
        let input = "ibge_code,name,party\n4104808,JOÃO DA SILVA\n";
        let rows: Vec<Result<Row, ApplicationError>> = read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.party, None);
    }

    #[test]
    fn test_quoted_field_keeps_embedded_delimiter() {
        let input = "ibge_code,name,party\n4104808,\"SILVA, JOÃO DA\",PT\n";
        let rows: Vec<Result<Row, ApplicationError>> = read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.name, "SILVA, JOÃO DA");
    }

    #[test]
    fn test_invalid_row_is_row_level_not_batch_fatal() {
        let input = "ibge_code,name,party\nnot-a-number,X,PT\n4104808,OK,PT\n";
        let rows: Vec<Result<Row, ApplicationError>> = read_csv(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_err());
        assert_eq!(rows[0].as_ref().unwrap_err().error_type, ErrorType::Validation);
        assert!(rows[1].is_ok());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result: Result<Vec<Result<Row, ApplicationError>>, ApplicationError> = read_csv_file(Path::new("/nonexistent/input.csv"));
        assert_eq!(result.unwrap_err().error_type, ErrorType::NotFound);
    }
}
