//! HTML report for a loan schedule
//!
//! Generates a self-contained HTML file with the summary, inline SVG charts and the full table.

use crate::cmd::ScenarioArgs;
use crate::core::{generate_schedule, Scenario, Schedule, ScheduleEntry};
use crate::utils::format_money;
use anyhow::Context;
use clap::Args;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::path::PathBuf;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 220.0;
const CHART_PADDING: f64 = 30.0;

#[derive(Args, Debug)]
pub struct ReportCommand {
    #[command(flatten)]
    scenario: ScenarioArgs,

    /// Output file path (default: opens in browser)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let scenario = self.scenario.to_scenario()?;
        let schedule = generate_schedule(&scenario.loan, scenario.rental.as_ref())?;
        let html = generate(&scenario, &schedule);

        if let Some(ref output_path) = self.output {
            std::fs::write(output_path, &html)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            println!("HTML report written to: {}", output_path.display());
        } else {
            let temp_path = std::env::temp_dir().join("gearing-report.html");
            std::fs::write(&temp_path, &html)?;
            opener::open(&temp_path)?;
            println!("Opened HTML report in browser: {}", temp_path.display());
        }

        Ok(())
    }
}

pub fn generate(scenario: &Scenario, schedule: &Schedule) -> String {
    let loan = &scenario.loan;
    let gearing = match (schedule.has_rental(), schedule.positive_gearing) {
        (false, _) => String::new(),
        (true, Some(point)) => format!(
            r#"<div class="card gain"><h3>Positive Gearing</h3><p class="value">Period {} ({})</p></div>"#,
            point.period_index,
            point.date.format("%Y-%m-%d")
        ),
        (true, None) => format!(
            r#"<div class="card loss"><h3>Positive Gearing</h3><p class="value">Not within {} periods</p></div>"#,
            schedule.entries.len()
        ),
    };
    let net_total = schedule.total_net_cash_flow().map_or(String::new(), |net| {
        format!(
            r#"<div class="card"><h3>Total Net Cash Flow</h3><p class="value">{}</p></div>"#,
            format_money(net)
        )
    });

    let balance_chart = line_chart(
        "Remaining balance",
        &schedule
            .entries
            .iter()
            .map(|e| e.remaining_balance)
            .collect::<Vec<_>>(),
        "balance",
    );
    let net_chart = if schedule.has_rental() {
        line_chart(
            "Net cash flow per period",
            &schedule
                .entries
                .iter()
                .filter_map(ScheduleEntry::net_cash_flow)
                .collect::<Vec<_>>(),
            "net",
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Loan Schedule Report</title>
    <style>{css}</style>
</head>
<body>
    <header>
        <h1>Loan Schedule Report</h1>
        <p>{principal} at {rate}% over {term} years, {frequency} repayments from {start}</p>
    </header>
    <main>
        <section class="summary-cards">
            <div class="card"><h3>Fixed Payment</h3><p class="value">{payment}</p></div>
            <div class="card"><h3>Total Interest</h3><p class="value">{interest}</p></div>
            <div class="card"><h3>Total Principal</h3><p class="value">{principal_paid}</p></div>
            <div class="card"><h3>Remaining Balance</h3><p class="value">{remaining}</p></div>
            {gearing}
            {net_total}
        </section>
        <section class="charts">
            {balance_chart}
            {net_chart}
        </section>
        <section class="data-section">
            <h2>Schedule <span class="count">{periods} periods</span></h2>
            <div class="table-container">
                <table>
{table}
                </table>
            </div>
        </section>
    </main>
</body>
</html>
"#,
        css = CSS,
        principal = format_money(loan.principal),
        rate = loan.annual_interest_rate_percent,
        term = loan.term_years,
        frequency = loan.frequency,
        start = loan.start_date.format("%Y-%m-%d"),
        payment = format_money(schedule.fixed_payment),
        interest = format_money(schedule.total_interest_paid),
        principal_paid = format_money(schedule.total_principal_paid),
        remaining = format_money(schedule.final_balance()),
        gearing = gearing,
        net_total = net_total,
        balance_chart = balance_chart,
        net_chart = net_chart,
        periods = schedule.entries.len(),
        table = schedule_table(schedule),
    )
}

fn schedule_table(schedule: &Schedule) -> String {
    let rental = schedule.has_rental();
    let gearing_period = schedule.positive_gearing.map(|p| p.period_index);
    let mut html = String::new();

    html.push_str("<thead><tr><th>#</th><th>Date</th><th>Payment</th><th>Interest</th><th>Principal</th><th>Balance</th>");
    if rental {
        html.push_str("<th>Rent</th><th>Agent Fee</th><th>Other Costs</th><th>Net Cash Flow</th>");
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for entry in &schedule.entries {
        let class = if gearing_period == Some(entry.period_index) {
            r#" class="geared""#
        } else {
            ""
        };
        html.push_str(&format!(
            "<tr{}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            class,
            entry.period_index,
            entry.date.format("%Y-%m-%d"),
            format_money(entry.payment),
            format_money(entry.interest_paid),
            format_money(entry.principal_paid),
            format_money(entry.remaining_balance),
        ));
        if let Some(ref flow) = entry.rental {
            html.push_str(&format!(
                "<td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
                format_money(flow.rent_income),
                format_money(flow.agent_fee),
                format_money(flow.other_costs),
                format_money(flow.net_cash_flow),
            ));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>");
    html
}

/// Inline SVG polyline, with a zero line when the series goes negative
fn line_chart(title: &str, values: &[Decimal], class: &str) -> String {
    if values.is_empty() {
        return String::new();
    }
    let points: Vec<f64> = values.iter().map(|v| v.to_f64().unwrap_or(0.0)).collect();
    let max = points.iter().cloned().fold(0.0_f64, f64::max);
    let min = points.iter().cloned().fold(0.0_f64, f64::min);
    let span = if max - min > 0.0 { max - min } else { 1.0 };

    let plot_width = CHART_WIDTH - 2.0 * CHART_PADDING;
    let plot_height = CHART_HEIGHT - 2.0 * CHART_PADDING;
    let step = if points.len() > 1 {
        plot_width / (points.len() - 1) as f64
    } else {
        0.0
    };
    let y = |v: f64| CHART_PADDING + (max - v) / span * plot_height;

    let path = points
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{:.1},{:.1}", CHART_PADDING + i as f64 * step, y(*v)))
        .collect::<Vec<_>>()
        .join(" ");

    let zero_line = if min < 0.0 {
        format!(
            r#"<line class="zero" x1="{pad}" x2="{end}" y1="{y:.1}" y2="{y:.1}" />"#,
            pad = CHART_PADDING,
            end = CHART_WIDTH - CHART_PADDING,
            y = y(0.0)
        )
    } else {
        String::new()
    };

    format!(
        r#"<figure class="chart">
    <figcaption>{title}</figcaption>
    <svg viewBox="0 0 {width} {height}" role="img" aria-label="{title}">
        {zero_line}
        <polyline class="{class}" fill="none" points="{path}" />
    </svg>
</figure>"#,
        title = title,
        width = CHART_WIDTH,
        height = CHART_HEIGHT,
        zero_line = zero_line,
        class = class,
        path = path,
    )
}

const CSS: &str = r#"
:root {
    --primary: #2563eb;
    --success: #16a34a;
    --danger: #dc2626;
    --gray-50: #f9fafb;
    --gray-200: #e5e7eb;
    --gray-500: #6b7280;
    --gray-900: #111827;
}

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
    background: var(--gray-50);
    color: var(--gray-900);
    line-height: 1.5;
}

header {
    background: white;
    border-bottom: 1px solid var(--gray-200);
    padding: 1.5rem 2rem;
}

header p {
    color: var(--gray-500);
}

main {
    padding: 2rem;
}

.summary-cards {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
    gap: 1rem;
    margin-bottom: 2rem;
}

.card {
    background: white;
    border: 1px solid var(--gray-200);
    border-radius: 8px;
    padding: 1rem;
}

.card h3 {
    font-size: 0.8rem;
    color: var(--gray-500);
    text-transform: uppercase;
}

.card .value {
    font-size: 1.4rem;
    font-weight: 600;
}

.card.gain .value {
    color: var(--success);
}

.card.loss .value {
    color: var(--danger);
}

.chart {
    background: white;
    border: 1px solid var(--gray-200);
    border-radius: 8px;
    padding: 1rem;
    margin-bottom: 1rem;
}

.chart polyline {
    stroke-width: 2;
}

.chart polyline.balance {
    stroke: var(--primary);
}

.chart polyline.net {
    stroke: var(--success);
}

.chart line.zero {
    stroke: var(--gray-500);
    stroke-dasharray: 4 4;
}

.table-container {
    overflow-x: auto;
}

table {
    width: 100%;
    border-collapse: collapse;
    background: white;
}

th, td {
    padding: 0.4rem 0.75rem;
    border-bottom: 1px solid var(--gray-200);
    text-align: right;
    white-space: nowrap;
}

tr.geared {
    background: #dcfce7;
}

.count {
    font-size: 0.9rem;
    color: var(--gray-500);
}
"#;
