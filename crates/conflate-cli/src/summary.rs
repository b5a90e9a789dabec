use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use conflate_core::ConflationReport;
use conflate_model::{DiagnosticKind, Profile, TransformRule};

pub fn print_profile(profile: &Profile) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Setting"), header_cell("Value")]);
    apply_table_style(&mut table);

    let reference = profile
        .reference_tag()
        .unwrap_or_else(|| "- (geometry only)".to_string());
    let query = profile
        .query
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|c| match &c.value_pattern {
                    Some(pattern) => format!("{}~{}", c.key, pattern),
                    None => c.key.clone(),
                })
                .collect::<Vec<_>>()
                .join(" AND ")
        })
        .collect::<Vec<_>>()
        .join("\nOR ");

    let rows: Vec<(&str, String)> = vec![
        ("source", profile.source_tag().unwrap_or("-").to_string()),
        ("reference tag", reference),
        ("query", query),
        ("master tags", list_or_dash(&profile.master_tags)),
        ("max distance", format!("{} m", profile.max_distance)),
        ("duplicate distance", format!("{} m", profile.duplicate_distance)),
        ("delete unmatched", yes_no(profile.delete_unmatched)),
        (
            "tag unmatched",
            list_or_dash(
                &profile
                    .tag_unmatched
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>(),
            ),
        ),
        (
            "transforms",
            list_or_dash(
                &profile
                    .transform
                    .iter()
                    .map(|entry| match &entry.rule {
                        TransformRule::Rename(to) => format!("{} -> {to}", entry.key),
                        TransformRule::Remove => format!("{} removed", entry.key),
                        TransformRule::Set(value) => format!("{} = {value}", entry.key),
                        TransformRule::Compute(f) => format!("{} = {}()", entry.key, f.name()),
                    })
                    .collect::<Vec<_>>(),
            ),
        ),
        ("bounded update", yes_no(profile.bounded_update)),
        ("overpass timeout", format!("{} s", profile.overpass_timeout)),
    ];
    for (setting, value) in rows {
        table.add_row(vec![
            Cell::new(setting).add_attribute(Attribute::Bold),
            Cell::new(value),
        ]);
    }
    println!("{table}");
}

pub fn print_summary(report: &ConflationReport) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Outcome"), header_cell("Features")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    let rows = [
        ("Dataset features", report.dataset_features, None),
        ("OSM features", report.osm_features, None),
        (
            "Skipped (malformed)",
            report.skipped_dataset + report.skipped_osm,
            Some(Color::Yellow),
        ),
        ("Duplicates", report.duplicates, Some(Color::DarkGrey)),
        (
            "Matched by reference",
            report.matched_by_reference,
            Some(Color::Green),
        ),
        ("Matched by distance", report.matched_by_distance, Some(Color::Green)),
        ("Unmatched", report.unmatched, None),
        ("Orphans", report.orphans, None),
    ];
    for (label, count, color) in rows {
        table.add_row(vec![Cell::new(label), count_cell(count, color)]);
    }
    println!("{table}");

    let mut actions = Table::new();
    actions.set_header(vec![header_cell("Action"), header_cell("Count")]);
    apply_table_style(&mut actions);
    align_column(&mut actions, 1, CellAlignment::Right);
    for (label, count, color) in [
        ("create", report.created, Color::Green),
        ("update", report.updated, Color::Blue),
        ("delete", report.deleted, Color::Red),
    ] {
        actions.add_row(vec![Cell::new(label), count_cell(count, Some(color))]);
    }
    actions.add_row(vec![dim_cell("unchanged"), dim_cell(report.unchanged)]);
    println!("{actions}");

    print_diagnostics(report);
}

fn print_diagnostics(report: &ConflationReport) {
    if !report.has_diagnostics() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Feature"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for diagnostic in &report.diagnostics {
        let kind = match diagnostic.kind {
            DiagnosticKind::FeatureData => Cell::new("SKIPPED").fg(Color::Yellow),
            DiagnosticKind::AmbiguousMatch => Cell::new("AMBIGUOUS").fg(Color::Magenta),
        };
        table.add_row(vec![
            kind,
            Cell::new(&diagnostic.subject),
            Cell::new(&diagnostic.message),
        ]);
    }
    println!();
    println!("Diagnostics:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Option<Color>) -> Cell {
    match color {
        _ if count == 0 => dim_cell(count),
        Some(color) => Cell::new(count).fg(color),
        None => Cell::new(count),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join("\n")
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}
