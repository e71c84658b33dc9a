use crate::error::Error;
use crate::sheet::Sheet;
use log::{error, info, warn};

pub const MAX_WRITE_ATTEMPTS: usize = 5;
pub const NOT_ENOUGH_SPACE: &str =
    "Not enough space to write the data - try again in an empty spreadsheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(usize),
    /// The sheet is full; `written` rows made it before the marker was placed.
    CapacityExceeded { written: usize },
    /// A row kept failing and the rest of the batch was dropped.
    Abandoned { written: usize },
    /// An earlier batch filled the sheet.
    Skipped,
}

/// Appends output rows one at a time, retrying transient failures.
pub struct SheetWriter<S: Sheet> {
    sheet: S,
    full: bool,
}

impl<S: Sheet> SheetWriter<S> {
    pub fn new(sheet: S) -> Self {
        SheetWriter { sheet, full: false }
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn write_rows(&mut self, rows: &[Vec<String>]) -> WriteOutcome {
        if self.full {
            warn!("Output sheet is full, skipping {} rows", rows.len());
            return WriteOutcome::Skipped;
        }

        for (written, row) in rows.iter().enumerate() {
            let mut attempt = 1;
            loop {
                match self.sheet.append_row(row) {
                    Ok(()) => break,
                    Err(err @ Error::SheetCapacityExceeded { .. }) => {
                        error!("Could not write to spreadsheet: '{}'", err);
                        self.mark_full();
                        return WriteOutcome::CapacityExceeded { written };
                    }
                    Err(err) if attempt >= MAX_WRITE_ATTEMPTS => {
                        error!("Could not write to spreadsheet: '{}'", err);
                        return WriteOutcome::Abandoned { written };
                    }
                    Err(err) => {
                        warn!("Write attempt {} failed: {}", attempt, err);
                        attempt += 1;
                    }
                }
            }
        }

        WriteOutcome::Written(rows.len())
    }

    fn mark_full(&mut self) {
        self.full = true;
        let row = self.sheet.last_row() + 2;
        if let Err(err) = self.sheet.set_cell(row, 1, NOT_ENOUGH_SPACE) {
            error!("Error writing 'not enough space' message: {}", err);
        }
    }

    /// Writes `value` into the 0-based `column` of the last row.
    pub fn stamp_time_run(&mut self, column: usize, value: &str) -> Result<(), Error> {
        let row = self.sheet.last_row();
        info!("Stamping time run {} on row {}", value, row);
        self.sheet.set_cell(row, column + 1, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::MockSheet;
    use mockall::predicate::{always, eq};

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n).map(|i| vec![format!("row {}", i)]).collect()
    }

    fn transient() -> Error {
        Error::SheetWrite {
            message: "service unavailable".to_string(),
        }
    }

    #[test]
    fn test_writes_every_row() {
        let mut sheet = MockSheet::new();
        sheet.expect_append_row().times(3).returning(|_| Ok(()));

        let mut writer = SheetWriter::new(sheet);
        assert_eq!(writer.write_rows(&rows(3)), WriteOutcome::Written(3));
        assert!(!writer.is_full());
    }

    #[test]
    fn test_transient_errors_retried() {
        let mut sheet = MockSheet::new();
        let mut seq = mockall::Sequence::new();
        sheet
            .expect_append_row()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(transient()));
        sheet
            .expect_append_row()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut writer = SheetWriter::new(sheet);
        assert_eq!(writer.write_rows(&rows(1)), WriteOutcome::Written(1));
    }

    #[test]
    fn test_gives_up_after_five_attempts() {
        let mut sheet = MockSheet::new();
        let mut seq = mockall::Sequence::new();
        sheet
            .expect_append_row()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sheet
            .expect_append_row()
            .times(MAX_WRITE_ATTEMPTS)
            .in_sequence(&mut seq)
            .returning(|_| Err(transient()));

        let mut writer = SheetWriter::new(sheet);
        assert_eq!(
            writer.write_rows(&rows(3)),
            WriteOutcome::Abandoned { written: 1 }
        );
        assert!(!writer.is_full());
    }

    #[test]
    fn test_capacity_marks_sheet_and_stops() {
        let mut sheet = MockSheet::new();
        sheet
            .expect_append_row()
            .times(1)
            .returning(|_| Err(Error::SheetCapacityExceeded { limit: 2_000_000 }));
        sheet.expect_last_row().return_const(10usize);
        sheet
            .expect_set_cell()
            .with(eq(12), eq(1), eq(NOT_ENOUGH_SPACE))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut writer = SheetWriter::new(sheet);
        assert_eq!(
            writer.write_rows(&rows(2)),
            WriteOutcome::CapacityExceeded { written: 0 }
        );
        assert!(writer.is_full());
        assert_eq!(writer.write_rows(&rows(1)), WriteOutcome::Skipped);
    }

    #[test]
    fn test_marker_failure_is_logged() {
        let mut sheet = MockSheet::new();
        sheet
            .expect_append_row()
            .returning(|_| Err(Error::SheetCapacityExceeded { limit: 4 }));
        sheet.expect_last_row().return_const(2usize);
        sheet
            .expect_set_cell()
            .returning(|_, _, _| Err(Error::SheetCapacityExceeded { limit: 4 }));

        let mut writer = SheetWriter::new(sheet);
        assert_eq!(
            writer.write_rows(&rows(1)),
            WriteOutcome::CapacityExceeded { written: 0 }
        );
        assert!(writer.is_full());
    }

    #[test]
    fn test_stamp_time_run_on_last_row() {
        let mut sheet = MockSheet::new();
        sheet.expect_last_row().return_const(7usize);
        sheet
            .expect_set_cell()
            .with(eq(7), eq(4), always())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut writer = SheetWriter::new(sheet);
        writer.stamp_time_run(3, "2024-01-01 10:00:00").unwrap();
    }
}
