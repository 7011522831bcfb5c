use models::{
    ChartKind, ChartSeries, DataPoint, ExpenseCategory, MonthlyRecord, ReferenceLine,
    SummaryStatistics, Trace, CATEGORY_COUNT,
};

use crate::dataset::Dataset;
use crate::error::DataError;

const MONTH_AXIS: &str = "Month";
const AMOUNT_AXIS: &str = "Amount";

/// Pure query layer over one loaded dataset. Every operation rebuilds its
/// output from the records; nothing is cached and nothing is mutated.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    dataset: Dataset,
}

impl MetricsEngine {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn ordered(&self) -> Result<Vec<&MonthlyRecord>, DataError> {
        if self.dataset.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        Ok(self.dataset.chronological())
    }

    /// Income per period as a single chronological line trace.
    pub fn income_trend(&self) -> Result<ChartSeries, DataError> {
        let points = self
            .ordered()?
            .iter()
            .map(|r| DataPoint {
                x: r.period_label(),
                y: r.income,
            })
            .collect();

        Ok(ChartSeries {
            kind: ChartKind::Line,
            title: "Monthly Income Trend".to_string(),
            x_label: Some(MONTH_AXIS.to_string()),
            y_label: Some(AMOUNT_AXIS.to_string()),
            traces: vec![Trace {
                name: "Income".to_string(),
                points,
            }],
            reference: None,
        })
    }

    /// Distribution of each category's total across all periods.
    pub fn expense_breakdown(&self) -> Result<ChartSeries, DataError> {
        if self.dataset.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        let totals = self.category_totals();
        let points = ExpenseCategory::ALL
            .iter()
            .map(|&category| DataPoint {
                x: category.column_name().to_string(),
                y: totals[category.index()],
            })
            .collect();

        Ok(ChartSeries {
            kind: ChartKind::Pie,
            title: "Annual Expense Breakdown".to_string(),
            x_label: None,
            y_label: None,
            traces: vec![Trace {
                name: "Expenses".to_string(),
                points,
            }],
            reference: None,
        })
    }

    /// One stacked-bar trace per category, stacked in the fixed category
    /// order, each chronological.
    pub fn monthly_expenses(&self) -> Result<ChartSeries, DataError> {
        let ordered = self.ordered()?;
        let traces = ExpenseCategory::ALL
            .iter()
            .map(|&category| Trace {
                name: category.column_name().to_string(),
                points: ordered
                    .iter()
                    .map(|r| DataPoint {
                        x: r.period_label(),
                        y: r.categories.get(category),
                    })
                    .collect(),
            })
            .collect();

        Ok(ChartSeries {
            kind: ChartKind::StackedBar,
            title: "Monthly Expenses by Category".to_string(),
            x_label: Some(MONTH_AXIS.to_string()),
            y_label: Some(AMOUNT_AXIS.to_string()),
            traces,
            reference: None,
        })
    }

    /// Savings and investments over the chronological period axis.
    pub fn savings_analysis(&self) -> Result<ChartSeries, DataError> {
        let ordered = self.ordered()?;
        let trace = |name: &str, value: fn(&MonthlyRecord) -> f64| Trace {
            name: name.to_string(),
            points: ordered
                .iter()
                .map(|r| DataPoint {
                    x: r.period_label(),
                    y: value(r),
                })
                .collect(),
        };

        Ok(ChartSeries {
            kind: ChartKind::DualLine,
            title: "Savings and Investments Trend".to_string(),
            x_label: Some(MONTH_AXIS.to_string()),
            y_label: Some(AMOUNT_AXIS.to_string()),
            traces: vec![
                trace("Savings", |r| r.savings),
                trace("Investments", |r| r.investments),
            ],
            reference: None,
        })
    }

    /// Per-period `income - total_expenses`, recomputed rather than read
    /// from the input column, with a break-even reference at zero.
    pub fn net_income_trend(&self) -> Result<ChartSeries, DataError> {
        let points = self
            .ordered()?
            .iter()
            .map(|r| DataPoint {
                x: r.period_label(),
                y: r.computed_net_income(),
            })
            .collect();

        Ok(ChartSeries {
            kind: ChartKind::LineWithReference,
            title: "Monthly Net Income Trend".to_string(),
            x_label: Some(MONTH_AXIS.to_string()),
            y_label: Some(AMOUNT_AXIS.to_string()),
            traces: vec![Trace {
                name: "Net Income".to_string(),
                points,
            }],
            reference: Some(ReferenceLine {
                y: 0.0,
                label: "Break-even Line".to_string(),
            }),
        })
    }

    /// Aggregate statistics over the whole dataset.
    pub fn summary(&self) -> Result<SummaryStatistics, DataError> {
        let records = self.dataset.records();
        if records.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        let months = records.len() as f64;

        let total_income: f64 = records.iter().map(|r| r.income).sum();
        let total_expenses: f64 = records.iter().map(|r| r.total_expenses).sum();
        let total_savings: f64 = records.iter().map(|r| r.savings).sum();
        let total_investments: f64 = records.iter().map(|r| r.investments).sum();
        let net_income = total_income - total_expenses;

        // Rate on disposable income. Once expenses meet or exceed income the
        // rate is not meaningful and reported as zero, never negative.
        let savings_rate = if net_income > 0.0 {
            (total_savings / net_income) * 100.0
        } else {
            0.0
        };
        let traditional_savings_rate = if total_income > 0.0 {
            (total_savings / total_income) * 100.0
        } else {
            0.0
        };

        let months_in_deficit = records
            .iter()
            .filter(|r| r.reported_net_income() < 0.0)
            .count();

        Ok(SummaryStatistics {
            total_income,
            total_expenses,
            total_savings,
            total_investments,
            net_income,
            average_monthly_income: total_income / months,
            average_monthly_expenses: total_expenses / months,
            average_monthly_savings: total_savings / months,
            savings_rate,
            traditional_savings_rate,
            months_in_deficit,
            largest_expense_category: self.largest_expense_category(),
        })
    }

    /// Annual total per category, in the fixed category order.
    fn category_totals(&self) -> [f64; CATEGORY_COUNT] {
        let mut totals = [0.0f64; CATEGORY_COUNT];
        for record in self.dataset.records() {
            for (category, amount) in record.categories.iter() {
                totals[category.index()] += amount;
            }
        }
        totals
    }

    /// Category with the largest annual total. The strict comparison scans
    /// in the fixed order, so the first maximum wins ties.
    fn largest_expense_category(&self) -> ExpenseCategory {
        let totals = self.category_totals();
        let mut best = ExpenseCategory::ALL[0];
        for &category in &ExpenseCategory::ALL[1..] {
            if totals[category.index()] > totals[best.index()] {
                best = category;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use models::CategoryAmounts;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    fn record(m: u32, income: f64, total_expenses: f64, savings: f64) -> MonthlyRecord {
        MonthlyRecord {
            period: month(m),
            income,
            categories: CategoryAmounts::new(),
            total_expenses,
            savings,
            investments: 0.0,
            net_income: Some(income - total_expenses),
        }
    }

    fn engine(records: Vec<MonthlyRecord>) -> MetricsEngine {
        MetricsEngine::new(Dataset::new(records))
    }

    #[test]
    fn test_summary_concrete_surplus_scenario() {
        // Incomes [1000, 1000, 1000], expenses [1200, 800, 800], savings 100.
        let e = engine(vec![
            record(1, 1000.0, 1200.0, 100.0),
            record(2, 1000.0, 800.0, 0.0),
            record(3, 1000.0, 800.0, 0.0),
        ]);
        let s = e.summary().unwrap();
        assert_eq!(s.total_income, 3000.0);
        assert_eq!(s.total_expenses, 2800.0);
        assert_eq!(s.net_income, 200.0);
        assert_eq!(s.months_in_deficit, 1);
        assert_eq!(s.savings_rate, 50.0);
    }

    #[test]
    fn test_summary_deficit_clamps_savings_rate_to_zero() {
        // Same incomes, but every month spends 1200: net income is -600.
        let e = engine(vec![
            record(1, 1000.0, 1200.0, 100.0),
            record(2, 1000.0, 1200.0, 0.0),
            record(3, 1000.0, 1200.0, 0.0),
        ]);
        let s = e.summary().unwrap();
        assert_eq!(s.net_income, -600.0);
        assert_eq!(s.savings_rate, 0.0);
        assert_eq!(s.months_in_deficit, 3);
    }

    #[test]
    fn test_summary_net_income_identity() {
        let e = engine(vec![
            record(1, 1234.5, 678.9, 10.0),
            record(2, 432.1, 987.6, 5.0),
        ]);
        let s = e.summary().unwrap();
        assert_eq!(s.net_income, s.total_income - s.total_expenses);
    }

    #[test]
    fn test_summary_zero_income_traditional_rate() {
        let e = engine(vec![record(1, 0.0, 0.0, 0.0)]);
        let s = e.summary().unwrap();
        assert_eq!(s.traditional_savings_rate, 0.0);
        assert_eq!(s.savings_rate, 0.0);
        assert!(s.savings_rate.is_finite());
    }

    #[test]
    fn test_summary_averages() {
        let e = engine(vec![
            record(1, 900.0, 600.0, 90.0),
            record(2, 1100.0, 400.0, 110.0),
        ]);
        let s = e.summary().unwrap();
        assert_eq!(s.average_monthly_income, 1000.0);
        assert_eq!(s.average_monthly_expenses, 500.0);
        assert_eq!(s.average_monthly_savings, 100.0);
    }

    #[test]
    fn test_months_in_deficit_uses_input_column() {
        // The input Net_Income column disagrees with the recompute; the
        // deficit count follows the column.
        let mut r = record(1, 1000.0, 800.0, 0.0);
        r.net_income = Some(-1.0);
        let e = engine(vec![r, record(2, 1000.0, 800.0, 0.0)]);
        assert_eq!(e.summary().unwrap().months_in_deficit, 1);
    }

    #[test]
    fn test_largest_expense_category_tie_break() {
        let mut categories = CategoryAmounts::new();
        categories.set(ExpenseCategory::Utilities, 500.0);
        categories.set(ExpenseCategory::Groceries, 500.0);
        let r = MonthlyRecord {
            categories,
            ..record(1, 1000.0, 1000.0, 0.0)
        };
        let e = engine(vec![r]);
        // Utilities and Groceries tie; Utilities comes first in the fixed
        // order, deterministically.
        for _ in 0..10 {
            assert_eq!(
                e.summary().unwrap().largest_expense_category,
                ExpenseCategory::Utilities
            );
        }
    }

    #[test]
    fn test_expense_breakdown_totals_equal_category_sums() {
        let mut first = CategoryAmounts::new();
        first.set(ExpenseCategory::Rent, 250.0);
        first.set(ExpenseCategory::DiningOut, 40.0);
        let mut second = CategoryAmounts::new();
        second.set(ExpenseCategory::Rent, 250.0);
        second.set(ExpenseCategory::Shopping, 75.0);

        let e = engine(vec![
            MonthlyRecord {
                categories: first,
                // Total_Expenses deliberately inconsistent with the
                // category sum; the breakdown must ignore it.
                ..record(1, 1000.0, 9999.0, 0.0)
            },
            MonthlyRecord {
                categories: second,
                ..record(2, 1000.0, 9999.0, 0.0)
            },
        ]);

        let breakdown = e.expense_breakdown().unwrap();
        assert_eq!(breakdown.kind, ChartKind::Pie);
        let by_label = |label: &str| {
            breakdown.traces[0]
                .points
                .iter()
                .find(|p| p.x == label)
                .map(|p| p.y)
                .unwrap()
        };
        assert_eq!(by_label("Rent"), 500.0);
        assert_eq!(by_label("Dining_Out"), 40.0);
        assert_eq!(by_label("Shopping"), 75.0);

        let total: f64 = breakdown.traces[0].points.iter().map(|p| p.y).sum();
        assert_eq!(total, 615.0);
    }

    #[test]
    fn test_income_trend_is_chronological_regardless_of_input_order() {
        let e = engine(vec![
            record(3, 30.0, 0.0, 0.0),
            record(1, 10.0, 0.0, 0.0),
            record(2, 20.0, 0.0, 0.0),
        ]);
        let chart = e.income_trend().unwrap();
        let xs: Vec<&str> = chart.traces[0].points.iter().map(|p| p.x.as_str()).collect();
        assert_eq!(xs, vec!["2024-01", "2024-02", "2024-03"]);
        let ys: Vec<f64> = chart.traces[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_monthly_expenses_stacking_order() {
        let e = engine(vec![record(1, 0.0, 0.0, 0.0)]);
        let chart = e.monthly_expenses().unwrap();
        assert_eq!(chart.kind, ChartKind::StackedBar);
        assert_eq!(chart.traces.len(), 11);
        assert_eq!(chart.traces[0].name, "Rent");
        assert_eq!(chart.traces[10].name, "Subscriptions");
    }

    #[test]
    fn test_savings_analysis_has_two_traces() {
        let mut r = record(1, 0.0, 0.0, 12.0);
        r.investments = 34.0;
        let chart = engine(vec![r]).savings_analysis().unwrap();
        assert_eq!(chart.kind, ChartKind::DualLine);
        assert_eq!(chart.traces[0].name, "Savings");
        assert_eq!(chart.traces[0].points[0].y, 12.0);
        assert_eq!(chart.traces[1].name, "Investments");
        assert_eq!(chart.traces[1].points[0].y, 34.0);
    }

    #[test]
    fn test_net_income_trend_recomputes_and_marks_break_even() {
        // Input column says -1; the trend must recompute 1000 - 800 = 200.
        let mut r = record(1, 1000.0, 800.0, 0.0);
        r.net_income = Some(-1.0);
        let chart = engine(vec![r]).net_income_trend().unwrap();
        assert_eq!(chart.kind, ChartKind::LineWithReference);
        assert_eq!(chart.traces[0].points[0].y, 200.0);
        let reference = chart.reference.unwrap();
        assert_eq!(reference.y, 0.0);
        assert_eq!(reference.label, "Break-even Line");
    }

    #[test]
    fn test_empty_dataset_is_a_data_error() {
        let e = engine(vec![]);
        assert_eq!(e.summary().unwrap_err(), DataError::EmptyDataset);
        assert_eq!(e.income_trend().unwrap_err(), DataError::EmptyDataset);
        assert_eq!(e.expense_breakdown().unwrap_err(), DataError::EmptyDataset);
        assert_eq!(e.monthly_expenses().unwrap_err(), DataError::EmptyDataset);
        assert_eq!(e.savings_analysis().unwrap_err(), DataError::EmptyDataset);
        assert_eq!(e.net_income_trend().unwrap_err(), DataError::EmptyDataset);
    }
}
