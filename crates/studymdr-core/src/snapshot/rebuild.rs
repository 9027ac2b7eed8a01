//! Render a frozen SoA snapshot back into a table
//!
//! Cell texts come from the captured item names, footnote symbols from the
//! frozen footnote list. The study day/week and visit window rows are not
//! part of the snapshot; they are rendered from the design of the same
//! version, located through the visit uids of the visit header row.

use std::collections::HashMap;

use crate::flowchart::builder::{
    time_header, visit_time_text, visit_window_text, SoALayout, EPOCH_ROW, NUM_HEADER_ROWS,
    TIME_ROW, VISIT_HEADER, VISIT_ROW, WINDOW_HEADER, WINDOW_ROW,
};
use crate::flowchart::design::{SoAItemType, StudyDesign, TimeUnit};
use crate::flowchart::table::{CellRef, RowLevel, SoaFootnote, SoaTable, TableCell, TableRow};

use super::references::SoASnapshot;

/// Rebuild a renderable table from `snapshot`
///
/// `design` must be the design of the snapshot's study version.
pub fn rebuild_table(
    snapshot: &SoASnapshot,
    design: &StudyDesign,
    layout: SoALayout,
    time_unit: Option<TimeUnit>,
) -> SoaTable {
    let unit = time_unit.unwrap_or(design.preferred_time_unit);

    let num_rows = snapshot
        .cell_references
        .iter()
        .map(|r| r.row_index + 1)
        .max()
        .unwrap_or(0)
        .max(NUM_HEADER_ROWS);
    let num_columns = snapshot
        .cell_references
        .iter()
        .map(|r| r.column_index + 1)
        .max()
        .unwrap_or(1);

    let mut rows: Vec<TableRow> = (0..num_rows)
        .map(|index| {
            let level = if index < NUM_HEADER_ROWS {
                RowLevel::Header
            } else {
                RowLevel::Activity
            };
            TableRow::new(level, vec![TableCell::default(); num_columns])
        })
        .collect();

    let symbols: HashMap<&str, &str> = snapshot
        .footnote_references
        .iter()
        .map(|f| (f.footnote_uid.as_str(), f.order_symbol.as_str()))
        .collect();

    for reference in &snapshot.cell_references {
        let item = &reference.referenced_item;
        let row = &mut rows[reference.row_index];
        if reference.row_hidden {
            row.hide = true;
        }
        if reference.column_index == 0 && reference.row_index >= NUM_HEADER_ROWS {
            if let Some(level) = RowLevel::for_label_item(item.item_type) {
                row.level = level;
            }
        }

        let cell = &mut row.cells[reference.column_index];
        if cell.refs.is_empty() {
            cell.text = item.item_name.clone().unwrap_or_default();
        }
        cell.refs.push(CellRef::new(item.item_type, &item.item_uid));
        for footnote_uid in &reference.footnote_references {
            if let Some(symbol) = symbols.get(footnote_uid.as_str()) {
                if !cell.footnotes.iter().any(|s| s == symbol) {
                    cell.footnotes.push(symbol.to_string());
                }
            }
        }
    }

    set_epoch_spans(&mut rows[EPOCH_ROW]);

    rows[VISIT_ROW].cells[0].text = VISIT_HEADER.to_string();
    rows[TIME_ROW].cells[0].text = time_header(unit).to_string();
    rows[WINDOW_ROW].cells[0].text = WINDOW_HEADER.to_string();
    for col in 1..num_columns {
        let visit_uid = rows[VISIT_ROW].cells[col]
            .refs
            .iter()
            .find(|r| r.item_type == SoAItemType::StudyVisit)
            .map(|r| r.uid.clone());
        if let Some(visit) = visit_uid.and_then(|uid| design.get_visit(&uid).ok()) {
            rows[TIME_ROW].cells[col].text = visit_time_text(visit, unit);
            rows[WINDOW_ROW].cells[col].text = visit_window_text(visit);
        }
    }

    SoaTable {
        title: layout.title().to_string(),
        num_header_rows: NUM_HEADER_ROWS,
        num_header_cols: 1,
        rows,
        footnotes: snapshot
            .footnote_references
            .iter()
            .map(|f| SoaFootnote {
                uid: f.footnote_uid.clone(),
                symbol: f.order_symbol.clone(),
                text: f.footnote_text.clone(),
            })
            .collect(),
        // Protocol tables never contain hidden rows
        show_hidden: layout != SoALayout::Protocol,
    }
}

/// Each epoch cell spans up to the next epoch cell
fn set_epoch_spans(row: &mut TableRow) {
    let starts: Vec<usize> = row
        .cells
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, cell)| !cell.refs.is_empty())
        .map(|(col, _)| col)
        .collect();

    let end = row.cells.len();
    for (i, &start) in starts.iter().enumerate() {
        let next = starts.get(i + 1).copied().unwrap_or(end);
        row.cells[start].span = (next - start) as u32;
        for covered in &mut row.cells[start + 1..next] {
            covered.span = 0;
        }
    }
}
