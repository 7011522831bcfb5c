use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use metrics_engine::{load_csv_path, MetricsEngine};

#[derive(Parser, Debug)]
#[command(
    name = "report",
    about = "Load a monthly finance CSV and print its summary statistics."
)]
struct Args {
    /// Path to the CSV file (Month, Income, category columns, ...)
    input: PathBuf,

    /// Also print the chart series as JSON
    #[arg(long)]
    charts: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let dataset = load_csv_path(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let engine = MetricsEngine::new(dataset);
    let summary = engine.summary()?;

    println!("Months analyzed:      {}", engine.dataset().len());
    println!("Total income:         {:.2}", summary.total_income);
    println!("Total expenses:       {:.2}", summary.total_expenses);
    println!("Net income:           {:.2}", summary.net_income);
    println!("Total savings:        {:.2}", summary.total_savings);
    println!("Total investments:    {:.2}", summary.total_investments);
    println!("Avg monthly income:   {:.2}", summary.average_monthly_income);
    println!("Avg monthly expenses: {:.2}", summary.average_monthly_expenses);
    println!("Avg monthly savings:  {:.2}", summary.average_monthly_savings);
    println!("Savings rate:         {:.1}%", summary.savings_rate);
    println!("Traditional rate:     {:.1}%", summary.traditional_savings_rate);
    println!("Months in deficit:    {}", summary.months_in_deficit);
    println!("Largest category:     {}", summary.largest_expense_category);

    if args.charts {
        let charts = serde_json::json!({
            "income_trend": engine.income_trend()?,
            "expense_breakdown": engine.expense_breakdown()?,
            "monthly_expenses": engine.monthly_expenses()?,
            "savings_analysis": engine.savings_analysis()?,
            "net_income_trend": engine.net_income_trend()?,
        });
        println!();
        println!("{}", serde_json::to_string_pretty(&charts)?);
    }

    Ok(())
}
