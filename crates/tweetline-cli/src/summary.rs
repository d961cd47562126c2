//! End-of-run report

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use tweetline_core::{RunSummary, fmt_num};

/// Why the run ended short of its target
fn shortfall(summary: &RunSummary, interrupted: bool) -> &'static str {
    if summary.target_reached() {
        ""
    } else if interrupted {
        " (interrupted)"
    } else {
        " (sources exhausted)"
    }
}

/// Key-value rows for the run totals
pub fn totals(summary: &RunSummary, interrupted: bool) -> Vec<(&'static str, String)> {
    vec![
        (
            "Written",
            format!(
                "{}/{}{}",
                fmt_num(summary.sink.written),
                fmt_num(summary.target),
                shortfall(summary, interrupted)
            ),
        ),
        (
            "Emitted",
            format!(
                "{} ({} duplicates)",
                fmt_num(summary.emitted()),
                fmt_num(summary.dedup.duplicates)
            ),
        ),
        ("Queries", fmt_num(summary.queries())),
        ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
    ]
}

/// Totals and per-worker table
pub fn table(summary: &RunSummary, interrupted: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Worker").fg(Color::Cyan),
            Cell::new("Until").fg(Color::Cyan),
            Cell::new("Queries").fg(Color::Cyan),
            Cell::new("Emitted").fg(Color::Cyan),
            Cell::new("Exit").fg(Color::Cyan),
        ]);
    for w in &summary.workers {
        let exit = Cell::new(&w.exit);
        let exit = if matches!(w.exit, tweetline_core::WorkerExit::Failed(_)) {
            exit.fg(Color::Red)
        } else {
            exit
        };
        table.add_row(vec![
            Cell::new(&w.name),
            Cell::new(w.until),
            Cell::new(fmt_num(w.queries)),
            Cell::new(fmt_num(w.emitted)),
            exit,
        ]);
    }
    for (label, value) in totals(summary, interrupted) {
        table.add_row(vec![Cell::new(label).fg(Color::Green), Cell::new(value)]);
    }
    table
}

/// Same content as [`table`], one log line each
pub fn log(summary: &RunSummary, interrupted: bool) {
    for w in &summary.workers {
        log::info!(
            "{}: until {}, {} queries, {} emitted, {}",
            w.name,
            w.until,
            w.queries,
            w.emitted,
            w.exit
        );
    }
    for (label, value) in totals(summary, interrupted) {
        log::info!("{label}: {value}");
    }
}
