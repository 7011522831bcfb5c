use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord};
use models::{CategoryAmounts, ExpenseCategory, MonthlyRecord, CATEGORY_COUNT};

use crate::error::SchemaError;

pub const PERIOD_COLUMN: &str = "Month";
pub const INCOME_COLUMN: &str = "Income";
pub const SAVINGS_COLUMN: &str = "Savings";
pub const INVESTMENTS_COLUMN: &str = "Investments";
pub const TOTAL_EXPENSES_COLUMN: &str = "Total_Expenses";
pub const NET_INCOME_COLUMN: &str = "Net_Income";

/// An ordered sequence of monthly records. Duplicated periods are kept as
/// distinct rows in input order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<MonthlyRecord>,
}

impl Dataset {
    pub fn new(records: Vec<MonthlyRecord>) -> Self {
        Self { records }
    }

    /// Records in input order.
    pub fn records(&self) -> &[MonthlyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by period. The sort is stable, so rows sharing a
    /// period stay in input order.
    pub fn chronological(&self) -> Vec<&MonthlyRecord> {
        let mut ordered: Vec<&MonthlyRecord> = self.records.iter().collect();
        ordered.sort_by_key(|r| r.period);
        ordered
    }
}

/// Header positions for every column the schema requires.
struct ColumnIndex {
    period: usize,
    income: usize,
    savings: usize,
    investments: usize,
    total_expenses: usize,
    net_income: Option<usize>,
    categories: [usize; CATEGORY_COUNT],
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnIndex, SchemaError> {
    let position = |name: &'static str| -> Result<usize, SchemaError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(SchemaError::MissingColumn(name))
    };

    // Checked in input-schema order, so the first missing column named in
    // the error follows the table layout.
    let period = position(PERIOD_COLUMN)?;
    let income = position(INCOME_COLUMN)?;
    let mut categories = [0usize; CATEGORY_COUNT];
    for category in ExpenseCategory::ALL {
        categories[category.index()] = position(category.column_name())?;
    }

    Ok(ColumnIndex {
        period,
        income,
        savings: position(SAVINGS_COLUMN)?,
        investments: position(INVESTMENTS_COLUMN)?,
        total_expenses: position(TOTAL_EXPENSES_COLUMN)?,
        // Net_Income is derivable, so its absence is tolerated.
        net_income: headers.iter().position(|h| h.trim() == NET_INCOME_COLUMN),
        categories,
    })
}

/// Parses period strings in YYYY-MM, YYYY-MM-DD or YYYY/MM format and
/// normalizes them to the first day of the month.
fn parse_period(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{value}/01"), "%Y/%m/%d"))
        .ok()
        .map(|d| d.with_day(1).unwrap_or(d))
}

fn parse_amount(
    row: &StringRecord,
    index: usize,
    column: &'static str,
    row_no: usize,
) -> Result<f64, SchemaError> {
    let raw = row.get(index).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| SchemaError::InvalidNumber {
        row: row_no,
        column,
        value: raw.to_string(),
    })
}

fn parse_record(
    row: &StringRecord,
    columns: &ColumnIndex,
    row_no: usize,
) -> Result<MonthlyRecord, SchemaError> {
    let raw_period = row.get(columns.period).unwrap_or("").trim();
    let period = parse_period(raw_period).ok_or_else(|| SchemaError::InvalidPeriod {
        row: row_no,
        value: raw_period.to_string(),
    })?;

    let mut categories = CategoryAmounts::new();
    for category in ExpenseCategory::ALL {
        let amount = parse_amount(
            row,
            columns.categories[category.index()],
            category.column_name(),
            row_no,
        )?;
        categories.set(category, amount);
    }

    // An empty Net_Income cell is treated like an absent column: derivable.
    let net_income = match columns.net_income {
        Some(index) => {
            let raw = row.get(index).unwrap_or("").trim();
            if raw.is_empty() {
                None
            } else {
                Some(parse_amount(row, index, NET_INCOME_COLUMN, row_no)?)
            }
        }
        None => None,
    };

    Ok(MonthlyRecord {
        period,
        income: parse_amount(row, columns.income, INCOME_COLUMN, row_no)?,
        categories,
        total_expenses: parse_amount(
            row,
            columns.total_expenses,
            TOTAL_EXPENSES_COLUMN,
            row_no,
        )?,
        savings: parse_amount(row, columns.savings, SAVINGS_COLUMN, row_no)?,
        investments: parse_amount(row, columns.investments, INVESTMENTS_COLUMN, row_no)?,
        net_income,
    })
}

fn read_dataset<R: Read>(mut rdr: csv::Reader<R>) -> Result<Dataset, SchemaError> {
    let headers = rdr.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in rdr.records().enumerate() {
        let row = result?;
        records.push(parse_record(&row, &columns, row_no)?);
    }

    Ok(Dataset::new(records))
}

/// Loads a headered CSV table into a dataset. Fails on the first missing
/// column, unparseable period or non-numeric amount.
pub fn load_csv<R: Read>(reader: R) -> Result<Dataset, SchemaError> {
    read_dataset(ReaderBuilder::new().has_headers(true).from_reader(reader))
}

/// Loads a dataset from a CSV file on disk.
pub fn load_csv_path<P: AsRef<Path>>(path: P) -> Result<Dataset, SchemaError> {
    read_dataset(csv::Reader::from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Month,Income,Rent,Utilities,Insurance,Loan_Payments,Groceries,Transportation,Entertainment,Healthcare,Shopping,Dining_Out,Subscriptions,Savings,Investments,Total_Expenses,Net_Income";

    fn csv_with_rows(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_load_csv_parses_rows() {
        let data = csv_with_rows(&[
            "2024-01,1000,100,50,30,80,120,40,60,20,50,40,20,100,50,610,390",
            "2024-02,1100,100,55,30,80,125,45,65,25,55,45,20,120,60,645,455",
        ]);
        let dataset = load_csv(data.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);

        let first = &dataset.records()[0];
        assert_eq!(first.period_label(), "2024-01");
        assert_eq!(first.income, 1000.0);
        assert_eq!(first.categories.get(ExpenseCategory::Rent), 100.0);
        assert_eq!(first.total_expenses, 610.0);
        assert_eq!(first.net_income, Some(390.0));
    }

    #[test]
    fn test_load_csv_missing_category_column() {
        let data = "Month,Income,Rent,Savings,Investments,Total_Expenses\n2024-01,1000,100,50,20,610";
        let err = load_csv(data.as_bytes()).unwrap_err();
        match err {
            SchemaError::MissingColumn(name) => assert_eq!(name, "Utilities"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_load_csv_bad_period_rejects_whole_file() {
        let data = csv_with_rows(&[
            "2024-01,1000,100,50,30,80,120,40,60,20,50,40,20,100,50,610,390",
            "not-a-month,1100,100,55,30,80,125,45,65,25,55,45,20,120,60,645,455",
        ]);
        let err = load_csv(data.as_bytes()).unwrap_err();
        match err {
            SchemaError::InvalidPeriod { row, value } => {
                assert_eq!(row, 1);
                assert_eq!(value, "not-a-month");
            }
            other => panic!("expected InvalidPeriod, got {other:?}"),
        }
    }

    #[test]
    fn test_load_csv_bad_number_rejects_whole_file() {
        let data = csv_with_rows(&[
            "2024-01,abc,100,50,30,80,120,40,60,20,50,40,20,100,50,610,390",
        ]);
        let err = load_csv(data.as_bytes()).unwrap_err();
        match err {
            SchemaError::InvalidNumber { row, column, value } => {
                assert_eq!(row, 0);
                assert_eq!(column, "Income");
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_load_csv_without_net_income_column() {
        let data = "Month,Income,Rent,Utilities,Insurance,Loan_Payments,Groceries,Transportation,Entertainment,Healthcare,Shopping,Dining_Out,Subscriptions,Savings,Investments,Total_Expenses\n\
                    2024-01,1000,100,50,30,80,120,40,60,20,50,40,20,100,50,610";
        let dataset = load_csv(data.as_bytes()).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.net_income, None);
        assert_eq!(record.reported_net_income(), 390.0);
    }

    #[test]
    fn test_parse_period_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_period("2024-03"), Some(expected));
        assert_eq!(parse_period("2024-03-15"), Some(expected));
        assert_eq!(parse_period("2024/03"), Some(expected));
        assert_eq!(parse_period("March 2024"), None);
        assert_eq!(parse_period(""), None);
    }

    #[test]
    fn test_chronological_is_stable_for_duplicate_periods() {
        let data = csv_with_rows(&[
            "2024-02,1,0,0,0,0,0,0,0,0,0,0,0,0,0,0,1",
            "2024-01,2,0,0,0,0,0,0,0,0,0,0,0,0,0,0,2",
            "2024-01,3,0,0,0,0,0,0,0,0,0,0,0,0,0,0,3",
        ]);
        let dataset = load_csv(data.as_bytes()).unwrap();
        let ordered = dataset.chronological();
        let incomes: Vec<f64> = ordered.iter().map(|r| r.income).collect();
        // Duplicated 2024-01 rows keep their input order.
        assert_eq!(incomes, vec![2.0, 3.0, 1.0]);
    }
}
