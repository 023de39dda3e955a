use crate::download::fetcher::FetchedFile;
use crate::table::error::LoadError;
use log::{info, warn};
use polars::prelude::*;
use std::path::Path;
use tokio::task;

/// Parses a downloaded CSV on a blocking task and assigns `column_names`
/// positionally.
///
/// The temporary file is dropped (and with it deleted from disk) once the
/// parse finishes, whether or not it succeeded.
pub async fn load_fetched(
    file: FetchedFile,
    column_names: &[String],
) -> Result<DataFrame, LoadError> {
    let names = column_names.to_vec();
    task::spawn_blocking(move || {
        let result = read_csv(file.path(), &names);
        drop(file);
        result
    })
    .await?
}

/// Reads a comma separated file with one header line and `"` quoting.
///
/// The header's own labels are discarded in favour of `column_names`, which
/// must match the file's column count exactly. Every record must carry the
/// same number of fields as the header. All columns are read as text; typing
/// happens during normalization.
pub fn read_csv(path: &Path, column_names: &[String]) -> Result<DataFrame, LoadError> {
    check_record_widths(path, column_names.len())?;

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(b',').with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?
        .finish()
        .map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    df.set_column_names(column_names.iter().map(String::as_str))
        .map_err(|e| LoadError::ColumnRename {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Fails on a header that is not `expected` wide, or on the first record
/// whose field count differs from the header.
fn check_record_widths(path: &Path, expected: usize) -> Result<(), LoadError> {
    let scan_error = |source: csv::Error| LoadError::Scan {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .quote(b'"')
        .flexible(false)
        .from_path(path)
        .map_err(scan_error)?;

    let header_width = reader.headers().map_err(scan_error)?.len();
    if header_width != expected {
        warn!(
            "CSV column count ({}) does not match schema length ({}) for {}",
            header_width,
            expected,
            path.display()
        );
        return Err(LoadError::SchemaMismatch {
            path: path.to_path_buf(),
            expected,
            found: header_width,
        });
    }

    let mut record = csv::ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) => {
                if let csv::ErrorKind::UnequalLengths { pos, len, .. } = e.kind() {
                    return Err(LoadError::RaggedRow {
                        path: path.to_path_buf(),
                        line: pos.as_ref().map(|p| p.line()).unwrap_or_default(),
                        expected,
                        found: *len as usize,
                    });
                }
                return Err(scan_error(e));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::table::schema::{default_source_columns, SOURCE_COLUMNS};
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// One CSV line in source column order. `overrides` replace the filler
    /// value of the named column.
    pub(crate) fn source_line(overrides: &[(&str, &str)]) -> String {
        SOURCE_COLUMNS
            .iter()
            .map(|column| {
                overrides
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_else(|| filler(column).to_string())
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn filler(column: &str) -> &'static str {
        match column {
            "YEAR" => "2015",
            "MONTH" => "8",
            "DATE" => "2015-08-01",
            "SITE" => "NAPL",
            "TRANSECT" => "1",
            "VIS" => "5.5",
            "SP_CODE" => "SFL",
            "PERCENT_COVER" => "0",
            "DENSITY" => "0.25",
            "WM_GM2" => "30.5",
            "DRY_GM2" => "12.4",
            "SFDM" => "7.1",
            "AFDM" => "2.2",
            "SCIENTIFIC_NAME" => "\"Mesocentrotus franciscanus\"",
            "COMMON_NAME" => "\"Red Urchin\"",
            "GROUP" => "INVERT",
            "MOBILITY" => "MOBILE",
            "GROWTH_MORPH" => "SOLITARY",
            _ => "Animalia",
        }
    }

    pub(crate) fn write_source_csv(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", SOURCE_COLUMNS.join(",")).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_assigns_names_positionally() -> Result<(), LoadError> {
        let file = write_source_csv(&[
            source_line(&[]),
            source_line(&[("YEAR", "2016"), ("COMMON_NAME", "\"Purple Urchin\"")]),
        ]);

        let df = read_csv(file.path(), &default_source_columns())?;

        assert_eq!(df.shape(), (2, 24));
        assert_eq!(df.get_column_names(), SOURCE_COLUMNS);
        Ok(())
    }

    #[test]
    fn test_header_labels_are_replaced() -> Result<(), LoadError> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,\"x, y\",3").unwrap();
        file.flush().unwrap();

        let names = vec!["ONE".to_string(), "TWO".to_string(), "THREE".to_string()];
        let df = read_csv(file.path(), &names)?;

        assert_eq!(df.get_column_names(), ["ONE", "TWO", "THREE"]);
        assert_eq!(df.height(), 1);
        let two = df.column("TWO").unwrap().str().unwrap();
        assert_eq!(two.get(0), Some("x, y"));
        Ok(())
    }

    #[test]
    fn test_too_few_columns_is_schema_mismatch() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", SOURCE_COLUMNS[..23].join(",")).unwrap();
        let row: Vec<&str> = (0..23).map(|_| "1").collect();
        writeln!(file, "{}", row.join(",")).unwrap();
        file.flush().unwrap();

        let result = read_csv(file.path(), &default_source_columns());

        match result {
            Err(LoadError::SchemaMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, 24);
                assert_eq!(found, 23);
            }
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_row_with_extra_fields_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        writeln!(file, "1,2,3,4,5").unwrap();
        file.flush().unwrap();

        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let result = read_csv(file.path(), &names);

        assert!(
            matches!(
                result,
                Err(LoadError::RaggedRow {
                    line: 3,
                    expected: 3,
                    found: 5,
                    ..
                })
            ),
            "Expected RaggedRow, got {:?}",
            result
        );
    }

    #[test]
    fn test_row_missing_trailing_field_is_rejected() {
        let full = source_line(&[]);
        let short = full[..full.rfind(',').unwrap()].to_string();
        let file = write_source_csv(&[full, short]);

        let result = read_csv(file.path(), &default_source_columns());

        match result {
            Err(LoadError::RaggedRow {
                line,
                expected,
                found,
                ..
            }) => {
                assert_eq!(line, 3);
                assert_eq!(expected, 24);
                assert_eq!(found, 23);
            }
            other => panic!("Expected RaggedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_late_decimal_does_not_break_parsing() -> Result<(), LoadError> {
        let mut lines = vec![source_line(&[("PERCENT_COVER", "0")]); 10_050];
        lines.push(source_line(&[("PERCENT_COVER", "2.5")]));
        let file = write_source_csv(&lines);

        let df = read_csv(file.path(), &default_source_columns())?;

        assert_eq!(df.height(), 10_051);
        let cover = df.column("PERCENT_COVER").unwrap();
        assert_eq!(cover.dtype(), &DataType::String);
        assert_eq!(cover.str().unwrap().get(10_050), Some("2.5"));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_fetched_removes_temp_file() -> Result<(), LoadError> {
        let file = write_source_csv(&[source_line(&[])]);
        let path = file.into_temp_path();
        let location = path.to_path_buf();
        let fetched = FetchedFile::new(path, 1, "test");

        let df = load_fetched(fetched, &default_source_columns()).await?;

        assert_eq!(df.height(), 1);
        assert!(!location.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_fetched_removes_temp_file_on_failure() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1,2").unwrap();
        file.flush().unwrap();
        let path = file.into_temp_path();
        let location = path.to_path_buf();
        let fetched = FetchedFile::new(path, 1, "test");

        let result = load_fetched(fetched, &default_source_columns()).await;

        assert!(matches!(result, Err(LoadError::SchemaMismatch { .. })));
        assert!(!location.exists());
    }
}
