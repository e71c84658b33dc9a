use crate::config::PLACEHOLDER_SPREADSHEET;
use crate::error::Error;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Cell limit of a single spreadsheet, counted over the whole grid.
pub const CELL_LIMIT: usize = 2_000_000;

#[cfg_attr(test, mockall::automock)]
pub trait Sheet {
    /// Returns the cells of a 1-based row, or an empty vector past the last row.
    fn row(&self, row: usize) -> Vec<String>;

    /// Returns every row from the 1-based `row` up to and including the last row.
    fn rows_from(&self, row: usize) -> Vec<Vec<String>>;

    /// 1-based index of the last row holding data, 0 when the sheet is empty.
    fn last_row(&self) -> usize;

    /// Appends a new row after the last row.
    /// # Errors
    /// [`Error::SheetCapacityExceeded`] when the grid would grow past its cell limit.
    fn append_row(&mut self, values: &[String]) -> Result<(), Error>;

    /// Overwrites a single 1-based cell, growing the grid when needed.
    fn set_cell(&mut self, row: usize, column: usize, value: &str) -> Result<(), Error>;
}

/// Name to position lookup built once from a header row.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    sheet: String,
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(sheet: &str, header: &[String]) -> Self {
        let mut columns = HashMap::new();
        for (position, name) in header.iter().enumerate() {
            // first occurrence wins on duplicate headers
            columns.entry(name.trim().to_string()).or_insert(position);
        }

        HeaderIndex {
            sheet: sheet.to_string(),
            columns,
        }
    }

    /// 0-based position of the column, if present.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }

    pub fn require(&self, column: &str) -> Result<usize, Error> {
        self.position(column).ok_or_else(|| Error::MissingColumn {
            sheet: self.sheet.clone(),
            column: column.to_string(),
        })
    }
}

/// A directory of CSV files, one per sheet.
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    dir: PathBuf,
}

impl Spreadsheet {
    pub fn open(location: &str) -> Result<Self, Error> {
        if location.trim() == PLACEHOLDER_SPREADSHEET {
            return Err(Error::Configuration {
                spreadsheet: location.to_string(),
                message: "make sure you've replaced the default with a valid spreadsheet location"
                    .to_string(),
            });
        }

        let dir = PathBuf::from(location);
        if !dir.is_dir() {
            return Err(Error::Configuration {
                spreadsheet: location.to_string(),
                message: "no such spreadsheet directory".to_string(),
            });
        }

        Ok(Spreadsheet { dir })
    }

    pub fn sheet_by_name(&self, name: &str) -> Result<CsvSheet, Error> {
        let path = self.dir.join(format!("{}.csv", name));
        if !path.is_file() {
            return Err(Error::Configuration {
                spreadsheet: self.dir.display().to_string(),
                message: format!("sheet '{}' not found", name),
            });
        }
        CsvSheet::open(&path)
    }

    /// Checks that a sheet can be edited, the same way an edit-access check would.
    pub fn check_writable(&self, name: &str) -> Result<(), Error> {
        let path = self.dir.join(format!("{}.csv", name));
        OpenOptions::new()
            .append(true)
            .open(&path)
            .map(|_| ())
            .map_err(|err| Error::Configuration {
                spreadsheet: self.dir.display().to_string(),
                message: format!("'{}'. You may not have edit access", err),
            })
    }
}

/// A sheet persisted as a headerless, flexible CSV file.
#[derive(Debug)]
pub struct CsvSheet {
    path: PathBuf,
    rows: Vec<Vec<String>>,
    width: usize,
    cell_limit: usize,
}

impl CsvSheet {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file));

        // the reader drops empty lines; they are put back so row numbers match the file
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut next_line = 1;
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map_or(next_line, |pos| pos.line());
            for _ in next_line..line {
                rows.push(vec![String::new()]);
            }

            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            let embedded_lines: u64 = cells.iter().map(|c| c.matches('\n').count() as u64).sum();
            next_line = line + 1 + embedded_lines;
            rows.push(cells);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Ok(CsvSheet {
            path: path.to_path_buf(),
            rows,
            width,
            cell_limit: CELL_LIMIT,
        })
    }

    #[cfg(test)]
    pub fn with_cell_limit(mut self, cell_limit: usize) -> Self {
        self.cell_limit = cell_limit;
        self
    }

    fn rewrite(&self) -> Result<(), Error> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool, Error> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl Sheet for CsvSheet {
    fn row(&self, row: usize) -> Vec<String> {
        row.checked_sub(1)
            .and_then(|idx| self.rows.get(idx))
            .cloned()
            .unwrap_or_default()
    }

    fn rows_from(&self, row: usize) -> Vec<Vec<String>> {
        let start = row.saturating_sub(1);
        self.rows.iter().skip(start).cloned().collect()
    }

    fn last_row(&self) -> usize {
        self.rows.len()
    }

    fn append_row(&mut self, values: &[String]) -> Result<(), Error> {
        let width = self.width.max(values.len());
        let cells = (self.rows.len() + 1) * width;
        if cells > self.cell_limit {
            return Err(Error::SheetCapacityExceeded {
                limit: self.cell_limit,
            });
        }

        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        if !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
        wtr.write_record(values)?;
        wtr.flush()?;

        self.rows.push(values.to_vec());
        self.width = width;
        Ok(())
    }

    fn set_cell(&mut self, row: usize, column: usize, value: &str) -> Result<(), Error> {
        if row == 0 || column == 0 {
            return Err(Error::SheetWrite {
                message: format!("invalid cell R{}C{}", row, column),
            });
        }

        if self.rows.len() < row {
            self.rows.resize(row, vec![String::new()]);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value.to_string();
        self.width = self.width.max(cells.len());

        self.rewrite()
    }
}

/// Creates a sheet file from rows, used to seed spreadsheets in tests.
#[cfg(test)]
pub fn write_sheet(dir: &Path, name: &str, rows: &[Vec<&str>]) -> PathBuf {
    let path = dir.join(format!("{}.csv", name));
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(&path)
        .unwrap();
    for row in rows {
        wtr.write_record(row).unwrap();
    }
    wtr.flush().unwrap();
    path
}
