//! Typed cell access.
//!
//! Every `read_*` returns `Ok(None)` for a blank cell and a
//! [`SheetError::Format`] when the content does not parse as the requested
//! type. Every `write_*` returns whether the stored value changed; writing
//! `None` clears the cell. A write that would not change the typed value
//! leaves the cell (and the document's dirty flag) untouched.

use crate::cell::CellValue;
use crate::error::{SheetError, SheetResult};
use crate::workbook::{ColumnRef, Workbook};
use chrono::{DateTime, NaiveDate, Utc};

macro_rules! integer_access {
    ($($read:ident, $write:ident, $ty:ty, $expected:literal;)*) => {
        $(
            #[doc = concat!("Reads the cell as `", stringify!($ty), "`.")]
            ///
            /// # Errors
            ///
            /// Returns a format error for non-numeric, fractional or out-of-range content.
            pub fn $read(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<$ty>> {
                let column = column.resolve(self)?;
                let cell = self.cell(row, column)?;
                match cell.as_integer() {
                    Ok(None) => Ok(None),
                    Ok(Some(n)) => <$ty>::try_from(n)
                        .map(Some)
                        .map_err(|_| SheetError::format(row, column, $expected, cell.to_field())),
                    Err(raw) => Err(SheetError::format(row, column, $expected, raw)),
                }
            }

            #[doc = concat!("Writes a `", stringify!($ty), "` value.")]
            pub fn $write(&mut self, row: usize, column: impl ColumnRef, value: Option<$ty>) -> SheetResult<bool> {
                self.write_integer(row, column, value.map(i64::from))
            }
        )*
    };
}

impl Workbook {
    /// Clears the cell. Reports a change only if the cell held content.
    pub fn write_blank(&mut self, row: usize, column: impl ColumnRef) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        if self.cell(row, column)?.is_blank() {
            return Ok(false);
        }
        self.put(row, column, CellValue::Blank)?;
        tracing::trace!(row, column, "cleared cell");
        Ok(true)
    }

    /// Reads the cell as text.
    pub fn read_string(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<String>> {
        Ok(self.cell(row, column)?.as_text())
    }

    /// Writes a text value; the empty string clears the cell.
    pub fn write_string(&mut self, row: usize, column: impl ColumnRef, value: Option<&str>) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        match value {
            None | Some("") => self.write_blank(row, column),
            Some(text) => {
                if self.read_string(row, column)?.as_deref() == Some(text) {
                    return Ok(false);
                }
                self.store(row, column, CellValue::Text(text.to_string()))
            }
        }
    }

    /// Reads the cell as a single character.
    ///
    /// # Errors
    ///
    /// Returns a format error if the cell holds more than one character.
    pub fn read_char(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<char>> {
        let column = column.resolve(self)?;
        let Some(text) = self.read_string(row, column)? else {
            return Ok(None);
        };
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Some(c)),
            _ => Err(SheetError::format(row, column, "character", text)),
        }
    }

    /// Writes a single character.
    pub fn write_char(&mut self, row: usize, column: impl ColumnRef, value: Option<char>) -> SheetResult<bool> {
        let text = value.map(String::from);
        self.write_string(row, column, text.as_deref())
    }

    /// Reads the cell as a floating point number.
    pub fn read_f64(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<f64>> {
        let column = column.resolve(self)?;
        self.cell(row, column)?
            .as_number()
            .map_err(|raw| SheetError::format(row, column, "numeric", raw))
    }

    /// Writes a floating point number.
    pub fn write_f64(&mut self, row: usize, column: impl ColumnRef, value: Option<f64>) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        let Some(value) = value else {
            return self.write_blank(row, column);
        };
        if self.cell(row, column)?.as_number().ok().flatten() == Some(value) {
            return Ok(false);
        }
        self.store(row, column, CellValue::Number(value))
    }

    fn write_integer(&mut self, row: usize, column: impl ColumnRef, value: Option<i64>) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        let Some(value) = value else {
            return self.write_blank(row, column);
        };
        if self.cell(row, column)?.as_integer().ok().flatten() == Some(value) {
            return Ok(false);
        }
        self.store(row, column, CellValue::Integer(value))
    }

    /// Reads the cell as `f32`.
    pub fn read_f32(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<f32>> {
        Ok(self.read_f64(row, column)?.map(|n| n as f32))
    }

    /// Writes an `f32` value.
    pub fn write_f32(&mut self, row: usize, column: impl ColumnRef, value: Option<f32>) -> SheetResult<bool> {
        self.write_f64(row, column, value.map(f64::from))
    }

    integer_access! {
        read_i64, write_i64, i64, "integer";
        read_i32, write_i32, i32, "32-bit integer";
        read_i16, write_i16, i16, "16-bit integer";
        read_i8, write_i8, i8, "8-bit integer";
    }

    /// Reads the cell as a boolean (`true`/`false`).
    pub fn read_bool(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<bool>> {
        let column = column.resolve(self)?;
        self.cell(row, column)?
            .as_bool()
            .map_err(|raw| SheetError::format(row, column, "boolean", raw))
    }

    /// Writes a boolean.
    pub fn write_bool(&mut self, row: usize, column: impl ColumnRef, value: Option<bool>) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        let Some(value) = value else {
            return self.write_blank(row, column);
        };
        if self.cell(row, column)?.as_bool().ok().flatten() == Some(value) {
            return Ok(false);
        }
        self.store(row, column, CellValue::Bool(value))
    }

    /// Reads the cell as an instant.
    pub fn read_date(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<DateTime<Utc>>> {
        let column = column.resolve(self)?;
        self.cell(row, column)?
            .as_date()
            .map_err(|raw| SheetError::format(row, column, "date", raw))
    }

    /// Writes an instant.
    pub fn write_date(
        &mut self,
        row: usize,
        column: impl ColumnRef,
        value: Option<DateTime<Utc>>,
    ) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        let Some(value) = value else {
            return self.write_blank(row, column);
        };
        if self.cell(row, column)?.as_date().ok().flatten() == Some(value) {
            return Ok(false);
        }
        self.store(row, column, CellValue::Date(value))
    }

    /// Reads the cell as a calendar day.
    pub fn read_day(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<NaiveDate>> {
        let column = column.resolve(self)?;
        self.cell(row, column)?
            .as_day()
            .map_err(|raw| SheetError::format(row, column, "day", raw))
    }

    /// Writes a calendar day.
    pub fn write_day(&mut self, row: usize, column: impl ColumnRef, value: Option<NaiveDate>) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        let Some(value) = value else {
            return self.write_blank(row, column);
        };
        if self.cell(row, column)?.as_day().ok().flatten() == Some(value) {
            return Ok(false);
        }
        self.store(row, column, CellValue::Day(value))
    }

    /// Reads a yes/no flag. Tokens match case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a format error for content other than the two tokens.
    pub fn read_yes_no(&self, row: usize, column: impl ColumnRef) -> SheetResult<Option<bool>> {
        let column = column.resolve(self)?;
        let Some(text) = self.read_string(row, column)? else {
            return Ok(None);
        };
        let token = text.trim();
        let options = self.options();
        if token.eq_ignore_ascii_case(&options.yes_token) {
            Ok(Some(true))
        } else if token.eq_ignore_ascii_case(&options.no_token) {
            Ok(Some(false))
        } else {
            Err(SheetError::format(row, column, "yes/no flag", text))
        }
    }

    /// Writes a yes/no flag using the configured tokens.
    ///
    /// Reports no change only when the cell already holds exactly the token.
    pub fn write_yes_no(&mut self, row: usize, column: impl ColumnRef, value: Option<bool>) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        let Some(value) = value else {
            return self.write_blank(row, column);
        };
        let token = if value {
            self.options().yes_token.clone()
        } else {
            self.options().no_token.clone()
        };
        if self.read_string(row, column)?.as_deref() == Some(token.as_str()) {
            return Ok(false);
        }
        self.store(row, column, CellValue::Text(token))
    }

    fn store(&mut self, row: usize, column: usize, value: CellValue) -> SheetResult<bool> {
        self.put(row, column, value)?;
        tracing::trace!(row, column, "wrote cell");
        Ok(true)
    }
}
