use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The closed set of expense categories a dataset tracks. The declaration
/// order is the fixed category order used for stacking and tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Rent,
    Utilities,
    Insurance,
    #[serde(rename = "Loan_Payments")]
    LoanPayments,
    Groceries,
    Transportation,
    Entertainment,
    Healthcare,
    Shopping,
    #[serde(rename = "Dining_Out")]
    DiningOut,
    Subscriptions,
}

pub const CATEGORY_COUNT: usize = 11;

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; CATEGORY_COUNT] = [
        ExpenseCategory::Rent,
        ExpenseCategory::Utilities,
        ExpenseCategory::Insurance,
        ExpenseCategory::LoanPayments,
        ExpenseCategory::Groceries,
        ExpenseCategory::Transportation,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Healthcare,
        ExpenseCategory::Shopping,
        ExpenseCategory::DiningOut,
        ExpenseCategory::Subscriptions,
    ];

    /// Column header for this category in the input table.
    pub fn column_name(self) -> &'static str {
        match self {
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Insurance => "Insurance",
            ExpenseCategory::LoanPayments => "Loan_Payments",
            ExpenseCategory::Groceries => "Groceries",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Healthcare => "Healthcare",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::DiningOut => "Dining_Out",
            ExpenseCategory::Subscriptions => "Subscriptions",
        }
    }

    /// Position in the fixed category order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// Per-category amounts for one month, indexed by the fixed category order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmounts([f64; CATEGORY_COUNT]);

impl CategoryAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: ExpenseCategory) -> f64 {
        self.0[category.index()]
    }

    pub fn set(&mut self, category: ExpenseCategory, amount: f64) {
        self.0[category.index()] = amount;
    }

    /// Iterate amounts in the fixed category order.
    pub fn iter(&self) -> impl Iterator<Item = (ExpenseCategory, f64)> + '_ {
        ExpenseCategory::ALL
            .iter()
            .map(move |&c| (c, self.0[c.index()]))
    }

    /// Sum of the 11 category amounts. Not necessarily equal to the
    /// `Total_Expenses` column, which is taken from the input as-is.
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// One row of the uploaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// Calendar month, normalized to its first day.
    pub period: NaiveDate,
    pub income: f64,
    pub categories: CategoryAmounts,
    /// Taken from the input column; never recomputed from `categories`.
    pub total_expenses: f64,
    pub savings: f64,
    pub investments: f64,
    /// Input `Net_Income` column, if the file carried one.
    pub net_income: Option<f64>,
}

impl MonthlyRecord {
    /// `YYYY-MM` label used on chart axes.
    pub fn period_label(&self) -> String {
        self.period.format("%Y-%m").to_string()
    }

    /// Net income recomputed from this row, ignoring the input column.
    pub fn computed_net_income(&self) -> f64 {
        self.income - self.total_expenses
    }

    /// Input net income when present, otherwise the per-row recompute.
    pub fn reported_net_income(&self) -> f64 {
        self.net_income.unwrap_or_else(|| self.computed_net_income())
    }
}

/// How the rendering layer should draw a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    StackedBar,
    Pie,
    DualLine,
    LineWithReference,
}

/// A single x/y (or label/value) pair within a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: String,
    pub y: f64,
}

/// One named sequence of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub points: Vec<DataPoint>,
}

/// A horizontal reference mark, drawn separately from the data traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub y: f64,
    pub label: String,
}

/// Renderer-agnostic chart data: traces plus display metadata. The engine
/// builds these; serialization to a wire format is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    pub traces: Vec<Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceLine>,
}

/// Aggregate statistics over a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_income: f64,
    /// Sum of the input `Total_Expenses` column, not of the category columns.
    pub total_expenses: f64,
    pub total_savings: f64,
    pub total_investments: f64,
    /// `total_income - total_expenses`.
    pub net_income: f64,
    pub average_monthly_income: f64,
    pub average_monthly_expenses: f64,
    pub average_monthly_savings: f64,
    /// Savings as a percentage of net income; 0.0 when net income is not
    /// positive.
    pub savings_rate: f64,
    /// Savings as a percentage of gross income; 0.0 when income is not
    /// positive.
    pub traditional_savings_rate: f64,
    /// Count of months whose net income is negative.
    pub months_in_deficit: usize,
    pub largest_expense_category: ExpenseCategory,
}
