//! Readers for the executable's whitespace-separated tabular output files:
//! the per-voltage spatial profile (`Var_<id>.dat`) and the current-voltage
//! sweep (`JV_<id>.dat`). The plotting layer consumes these tables.

use crate::domain::{CoreResult, StudioError};

/// Column set of the current-voltage sweep file, used when the executable
/// produced an empty sweep.
pub const JV_SWEEP_COLUMNS: [&str; 12] = [
    "Vext", "Jext", "convIndex", "P", "Jphoto", "Jdir", "JBulkSRH", "JIntLeft", "JIntRight",
    "JminLeft", "JminRight", "JShunt",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl DataTable {
    /// Parses a header row of column names followed by numeric rows.
    pub fn parse(source: &str) -> CoreResult<Self> {
        let mut lines = source.lines().filter(|line| !line.trim().is_empty());
        let header = lines.next().ok_or_else(|| {
            StudioError::parse("PARSE.TABLE_HEADER", "tabular output is missing a header row")
        })?;
        let columns: Vec<String> = header.split_whitespace().map(str::to_string).collect();

        let mut rows = Vec::new();
        for (index, line) in lines.enumerate() {
            let row_number = index + 1;
            let row = line
                .split_whitespace()
                .map(|token| parse_table_value(token, row_number))
                .collect::<CoreResult<Vec<f64>>>()?;
            if row.len() != columns.len() {
                return Err(StudioError::parse(
                    "PARSE.TABLE_ROW",
                    format!(
                        "row {} holds {} values but the header names {} columns",
                        row_number,
                        row.len(),
                        columns.len()
                    ),
                ));
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Like `parse`, but an entirely empty source yields an empty table with
    /// the given column set (the executable writes an empty sweep file for
    /// some device types).
    pub fn parse_or_empty(source: &str, default_columns: &[&str]) -> CoreResult<Self> {
        if source.trim().is_empty() {
            return Ok(Self {
                columns: default_columns.iter().map(|c| (*c).to_string()).collect(),
                rows: Vec::new(),
            });
        }
        Self::parse(source)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> CoreResult<Vec<f64>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Rows whose `column` value equals `value` exactly; the profile file
    /// repeats each voltage verbatim, so no tolerance is involved.
    pub fn filter_by(&self, column: &str, value: f64) -> CoreResult<DataTable> {
        let index = self.column_index(column)?;
        Ok(Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| row[index] == value)
                .cloned()
                .collect(),
        })
    }

    /// Sorted, deduplicated values of one column; the voltage slider of the
    /// results view is fed from this.
    pub fn distinct(&self, column: &str) -> CoreResult<Vec<f64>> {
        let mut values = self.column(column)?;
        values.sort_by(f64::total_cmp);
        values.dedup();
        Ok(values)
    }

    fn column_index(&self, name: &str) -> CoreResult<usize> {
        self.columns
            .iter()
            .position(|candidate| candidate == name)
            .ok_or_else(|| {
                StudioError::not_found(
                    "TABLE.COLUMN",
                    format!("tabular output has no column named '{}'", name),
                )
            })
    }
}

fn parse_table_value(token: &str, row_number: usize) -> CoreResult<f64> {
    let normalized = token.replace(['D', 'd'], "E");
    normalized.parse::<f64>().map_err(|_| {
        StudioError::parse(
            "PARSE.TABLE_VALUE",
            format!("row {} holds non-numeric value '{}'", row_number, token),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{DataTable, JV_SWEEP_COLUMNS};
    use crate::domain::StudioErrorCategory;

    const SWEEP: &str = "\
Vext Jext convIndex P Jphoto Jdir JBulkSRH JIntLeft JIntRight JminLeft JminRight JShunt
0.0 -200.1 1 0.0 -210.0 5.1 2.2 1.0 0.9 0.4 0.3 0.1
0.1 -198.7 1 -19.87 -210.0 6.3 2.4 1.1 1.0 0.4 0.3 0.1
";

    #[test]
    fn sweep_parses_with_named_columns() {
        let table = DataTable::parse(SWEEP).expect("sweep should parse");
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().len(), JV_SWEEP_COLUMNS.len());

        let current = table.column("Jext").expect("Jext column should exist");
        assert_eq!(current, vec![-200.1, -198.7]);
    }

    #[test]
    fn empty_sweep_yields_an_empty_table_with_known_columns() {
        let table =
            DataTable::parse_or_empty("", &JV_SWEEP_COLUMNS).expect("empty sweep is tolerated");
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 12);
        assert!(table.column("Vext").expect("Vext column exists").is_empty());
    }

    #[test]
    fn ragged_rows_are_rejected_with_their_row_number() {
        let source = "x V\n1.0 2.0\n3.0\n";
        let error = DataTable::parse(source).expect_err("ragged row should fail");
        assert_eq!(error.category(), StudioErrorCategory::Parse);
        assert!(error.message().contains("row 2"));
    }

    #[test]
    fn non_numeric_cells_are_rejected() {
        let source = "x V\n1.0 fast\n";
        let error = DataTable::parse(source).expect_err("text cell should fail");
        assert_eq!(error.code(), "PARSE.TABLE_VALUE");
        assert!(error.message().contains("'fast'"));
    }

    #[test]
    fn voltage_filter_and_distinct_support_the_results_view() {
        let source = "x Vext n\n0.0 0.0 1.0\n1.0 0.0 2.0\n0.0 0.5 3.0\n1.0 0.5 4.0\n";
        let table = DataTable::parse(source).expect("profile should parse");

        let voltages = table.distinct("Vext").expect("Vext column exists");
        assert_eq!(voltages, vec![0.0, 0.5]);

        let at_half = table.filter_by("Vext", 0.5).expect("filter should run");
        assert_eq!(at_half.len(), 2);
        assert_eq!(at_half.column("n").expect("n column exists"), vec![3.0, 4.0]);
    }

    #[test]
    fn missing_column_lookup_is_a_not_found_error() {
        let table = DataTable::parse("x V\n0.0 1.0\n").expect("table should parse");
        let error = table.column("J").expect_err("missing column should fail");
        assert_eq!(error.category(), StudioErrorCategory::NotFound);
    }
}
