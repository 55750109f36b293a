//! # Roster Source Reader
//!
//! Reads the external guest list: a delimited text file whose header names the
//! columns `GuestGroup`, `GuestId` and `GuestName` (in any order, any case).
//! Rows are produced lazily, one [`RosterRow`] per data line.
//!
//! Errors are split by how the reconciliation engine must react to them:
//! - [`RosterError::Unavailable`] / [`RosterError::Header`]: the source cannot
//!   be interpreted at all, nothing may be changed.
//! - [`RosterError::Malformed`]: a single row is unusable and is skipped.
//! - [`RosterError::Read`]: the stream broke after it was opened.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

pub const GROUP_COLUMN: &str = "GuestGroup";
pub const GUEST_COLUMN: &str = "GuestId";
pub const NAME_COLUMN: &str = "GuestName";

/// One parsed roster line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub group_id: i64,
    pub guest_id: i64,
    pub name: String,
}

impl RosterRow {
    pub fn new(group_id: i64, guest_id: i64, name: impl Into<String>) -> Self {
        Self {
            group_id,
            guest_id,
            name: name.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster file {path} cannot be opened: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("roster header is invalid: {0}")]
    Header(String),

    #[error("roster line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("roster read failed: {0}")]
    Read(#[source] csv::Error),
}

impl RosterError {
    /// Whether the error affects only the current row.
    pub fn is_row_level(&self) -> bool {
        matches!(self, RosterError::Malformed { .. })
    }
}

/// Picks the separator occurring most often in the header line.
pub fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .rev()
        .max_by_key(|&d| header_line.matches(d as char).count())
        .filter(|&d| header_line.contains(d as char))
        .unwrap_or(b',')
}

fn normalize_cell(cell: &str) -> String {
    cell.replace('\u{00A0}', " ").trim().to_string()
}

struct Columns {
    group: usize,
    guest: usize,
    name: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, RosterError> {
        let find = |title: &str| {
            headers
                .iter()
                .position(|h| {
                    normalize_cell(h.trim_start_matches('\u{FEFF}')).eq_ignore_ascii_case(title)
                })
                .ok_or_else(|| RosterError::Header(format!("missing column '{}'", title)))
        };
        Ok(Self {
            group: find(GROUP_COLUMN)?,
            guest: find(GUEST_COLUMN)?,
            name: find(NAME_COLUMN)?,
        })
    }
}

type Source<R> = io::Chain<Cursor<Vec<u8>>, BufReader<R>>;

/// Lazy iterator over the rows of a roster source.
///
/// After a [`RosterError::Read`] has been yielded the iterator is exhausted.
pub struct RosterReader<R: Read> {
    csv: csv::Reader<Source<R>>,
    columns: Columns,
    record: csv::StringRecord,
    done: bool,
}

impl RosterReader<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RosterError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }
}

impl<R: Read> RosterReader<R> {
    /// Reads the header line to find the delimiter and the column positions.
    pub fn from_reader(inner: R) -> Result<Self, RosterError> {
        let mut reader = BufReader::new(inner);
        let mut header = Vec::new();
        reader
            .read_until(b'\n', &mut header)
            .map_err(|e| RosterError::Read(csv::Error::from(e)))?;
        if header.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(RosterError::Header("roster is empty".to_string()));
        }
        let delimiter = detect_delimiter(&String::from_utf8_lossy(&header));

        let mut csv = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(Cursor::new(header).chain(reader));
        let headers = csv.headers().map_err(RosterError::Read)?.clone();
        let columns = Columns::locate(&headers)?;

        Ok(Self {
            csv,
            columns,
            record: csv::StringRecord::new(),
            done: false,
        })
    }

    fn parse_record(&self) -> Result<RosterRow, RosterError> {
        let line = self.record.position().map(|p| p.line()).unwrap_or_default();
        let malformed = |reason: String| RosterError::Malformed { line, reason };
        let cell = |idx: usize, title: &str| {
            self.record
                .get(idx)
                .map(normalize_cell)
                .ok_or_else(|| malformed(format!("missing {}", title)))
        };

        let group = cell(self.columns.group, GROUP_COLUMN)?;
        let guest = cell(self.columns.guest, GUEST_COLUMN)?;
        let name = cell(self.columns.name, NAME_COLUMN)?;

        let group_id = group
            .parse::<i64>()
            .map_err(|_| malformed(format!("{} '{}' is not an integer", GROUP_COLUMN, group)))?;
        let guest_id = guest
            .parse::<i64>()
            .map_err(|_| malformed(format!("{} '{}' is not an integer", GUEST_COLUMN, guest)))?;
        if name.is_empty() {
            return Err(malformed(format!("{} is empty", NAME_COLUMN)));
        }

        Ok(RosterRow {
            group_id,
            guest_id,
            name,
        })
    }
}

impl<R: Read> Iterator for RosterReader<R> {
    type Item = Result<RosterRow, RosterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.csv.read_record(&mut self.record) {
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                // Blank lines carry no row.
                Ok(true) if self.record.iter().all(|c| c.trim().is_empty()) => continue,
                Ok(true) => return Some(self.parse_record()),
                Err(err) => return Some(Err(self.classify(err))),
            }
        }
    }
}

impl<R: Read> RosterReader<R> {
    fn classify(&mut self, err: csv::Error) -> RosterError {
        if let csv::ErrorKind::Io(_) = err.kind() {
            self.done = true;
            return RosterError::Read(err);
        }
        let line = err.position().map(|p| p.line()).unwrap_or_default();
        RosterError::Malformed {
            line,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read_all(text: &str) -> Vec<Result<RosterRow, RosterError>> {
        RosterReader::from_reader(text.as_bytes())
            .expect("valid header")
            .collect()
    }

    #[test]
    fn detects_delimiters() {
        assert_eq!(detect_delimiter("GuestGroup,GuestId,GuestName"), b',');
        assert_eq!(detect_delimiter("GuestGroup;GuestId;GuestName"), b';');
        assert_eq!(detect_delimiter("GuestGroup\tGuestId\tGuestName"), b'\t');
        assert_eq!(detect_delimiter("GuestGroup|GuestId|GuestName"), b'|');
        assert_eq!(detect_delimiter("GuestGroup"), b',');
    }

    #[test]
    fn reads_rows_in_source_order() {
        let rows = read_all("GuestGroup,GuestId,GuestName\n1,1,Alice\r\n1,3,\"Carol, Jr.\"\n2,5,Dan\n");
        let rows: Vec<RosterRow> = rows.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            rows,
            vec![
                RosterRow::new(1, 1, "Alice"),
                RosterRow::new(1, 3, "Carol, Jr."),
                RosterRow::new(2, 5, "Dan"),
            ]
        );
    }

    #[test]
    fn columns_are_found_by_name() {
        let rows = read_all("guestname;GUESTID; GuestGroup \n  Alice\u{00A0};7;3\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(*rows[0].as_ref().unwrap(), RosterRow::new(3, 7, "Alice"));
    }

    #[test]
    fn malformed_rows_are_reported_individually() {
        let rows = read_all("GuestGroup,GuestId,GuestName\nx,1,Alice\n1,2,\n1\n\n1,4,Eve\n");
        assert_eq!(rows.len(), 4);
        assert!(rows[..3]
            .iter()
            .all(|r| matches!(r, Err(e) if e.is_row_level())));
        assert_eq!(*rows[3].as_ref().unwrap(), RosterRow::new(1, 4, "Eve"));
    }

    #[test]
    fn missing_header_column_is_rejected() {
        let err = RosterReader::from_reader("GuestGroup,GuestName\n1,Alice\n".as_bytes())
            .err()
            .expect("header error");
        assert!(matches!(err, RosterError::Header(_)));

        let err = RosterReader::from_reader("".as_bytes()).err().expect("empty");
        assert!(matches!(err, RosterError::Header(_)));
    }

    #[test]
    fn header_only_roster_has_no_rows() {
        assert!(read_all("GuestGroup,GuestId,GuestName\n").is_empty());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = RosterReader::open(dir.path().join("nope.csv"))
            .err()
            .expect("missing file");
        assert!(matches!(err, RosterError::Unavailable { .. }));
    }

    #[test]
    fn opens_files_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GuestGroup,GuestId,GuestName").unwrap();
        writeln!(file, "4,1,Grace").unwrap();
        let rows: Vec<_> = RosterReader::open(file.path()).unwrap().collect();
        assert_eq!(*rows[0].as_ref().unwrap(), RosterRow::new(4, 1, "Grace"));
    }
}
