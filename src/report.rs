use crate::aggregate::{AggregatePoint, Totals};
use crate::entry::{Entry, EntryForm};
use crate::format::{is_positive, percent, us_date, usd};
use crate::session::Session;
use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{
    presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor, ContentArrangement,
    Table,
};
use eyre::WrapErr;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ReportJson<'a> {
    entries: &'a [Entry],
    aggregates: Vec<AggregatePoint>,
}

pub fn load_forms(path: &Path) -> eyre::Result<Vec<EntryForm>> {
    let data = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Error reading file: {}", path.display()))?;
    serde_json::from_str(&data)
        .wrap_err_with(|| format!("{} is not a JSON array of entries", path.display()))
}

/// Feeds every form through a fresh session, returning it and the rejected count.
pub fn replay(forms: Vec<EntryForm>, today: NaiveDate) -> (Session, usize) {
    let mut session = Session::new();
    let mut rejected = 0;
    for (i, form) in forms.into_iter().enumerate() {
        if let Err(e) = session.submit_form(form, today) {
            tracing::warn!(item = i, "skipping entry: {e}");
            rejected += 1;
        }
    }
    (session, rejected)
}

fn signed_cell(value: f64, text: String) -> Cell {
    let c = if is_positive(value) {
        TColor::Green
    } else {
        TColor::Red
    };
    Cell::new(text).set_alignment(CellAlignment::Right).fg(c)
}

fn money_cell(value: f64) -> Cell {
    Cell::new(usd(value)).set_alignment(CellAlignment::Right)
}

fn new_table(width: u16) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(width);
    table
}

pub fn entries_table(entries: &[Entry], totals: &Totals) -> Table {
    let mut table = new_table(140);
    table.set_header(
        [
            "Date",
            "Investor",
            "Portfolio Key",
            "Initial ($)",
            "Final ($)",
            "Performance (%)",
            "Profit/Loss ($)",
            "Commission ($)",
        ]
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    for entry in entries {
        table.add_row(vec![
            Cell::new(us_date(entry.recorded_on())),
            Cell::new(entry.investor_name()),
            Cell::new(entry.portfolio_label()),
            money_cell(entry.initial_value()),
            money_cell(entry.final_value()),
            signed_cell(entry.performance(), percent(entry.performance())),
            signed_cell(entry.profit(), usd(entry.profit())),
            money_cell(entry.commission()),
        ]);
    }

    if !entries.is_empty() {
        table.add_row(vec![
            Cell::new("TOTAL").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            money_cell(totals.initial_value).add_attribute(Attribute::Bold),
            money_cell(totals.final_value).add_attribute(Attribute::Bold),
            Cell::new(""),
            signed_cell(totals.profit, usd(totals.profit)).add_attribute(Attribute::Bold),
            money_cell(totals.commission).add_attribute(Attribute::Bold),
        ]);
    }
    table
}

pub fn aggregates_table(points: &[AggregatePoint]) -> Table {
    let mut table = new_table(80);
    table.set_header(
        ["Date", "Entries", "Avg Performance (%)", "Total Profit ($)"]
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );
    for point in points {
        let label = if point.group_key.is_empty() {
            "(no date)"
        } else {
            point.group_key.as_str()
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(point.count).set_alignment(CellAlignment::Right),
            signed_cell(point.avg_performance, percent(point.avg_performance)),
            signed_cell(point.total_profit, usd(point.total_profit)),
        ]);
    }
    table
}

fn summary_line(session: &Session, rejected: usize) -> String {
    let totals = session.totals();
    let profit = usd(totals.profit);
    let profit = if is_positive(totals.profit) {
        profit.green()
    } else {
        profit.red()
    };
    let mut line = format!(
        "{} entries, total profit {}, commission {}",
        session.entries().len(),
        profit,
        usd(totals.commission).bold()
    );
    if rejected > 0 {
        line.push_str(&format!(
            " ({})",
            format!("{rejected} skipped, missing required fields").yellow()
        ));
    }
    line
}

pub fn run_report(path: &Path, json: bool, today: NaiveDate) -> eyre::Result<()> {
    let forms = load_forms(path)?;
    tracing::info!(count = forms.len(), file = %path.display(), "loaded report input");
    let (session, rejected) = replay(forms, today);

    if json {
        let out = ReportJson {
            entries: session.entries(),
            aggregates: session.aggregates(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&out).wrap_err("failed to serialize report")?
        );
        return Ok(());
    }

    println!("{}", entries_table(session.entries(), &session.totals()));
    println!("{}", aggregates_table(&session.aggregates()));
    println!("{}", summary_line(&session, rejected));
    Ok(())
}
