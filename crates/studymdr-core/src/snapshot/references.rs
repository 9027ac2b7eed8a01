//! Persistable reference lists of a rendered SoA table

use serde::{Deserialize, Serialize};

use crate::flowchart::design::SoAItemType;
use crate::flowchart::table::SoaTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedItem {
    pub item_uid: String,
    pub item_type: SoAItemType,
    /// Cell text at build time ("X" for schedules)
    pub item_name: Option<String>,
}

/// One item referenced from one cell
///
/// A cell referencing several items yields several entries with the same
/// coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoACellReference {
    pub row_index: usize,
    pub column_index: usize,
    pub referenced_item: ReferencedItem,
    /// Uids of the footnotes shown on the cell
    pub footnote_references: Vec<String>,
    /// The cell's row is hidden but rendered for styling
    #[serde(default)]
    pub row_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoAFootnoteReference {
    pub footnote_uid: String,
    pub order_symbol: String,
    pub footnote_text: String,
}

/// Frozen form of one SoA layout of one study version
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoASnapshot {
    pub cell_references: Vec<SoACellReference>,
    pub footnote_references: Vec<SoAFootnoteReference>,
}

impl SoASnapshot {
    pub fn is_empty(&self) -> bool {
        self.cell_references.is_empty() && self.footnote_references.is_empty()
    }

    /// Capture every cell reference and footnote of `table`
    ///
    /// Cells are walked row by row, left to right; hidden rows are
    /// included when the table shows them.
    pub fn from_table(table: &SoaTable) -> Self {
        let mut cell_references = Vec::new();

        for (row_index, row) in table.visible_rows() {
            for (column_index, cell) in row.cells.iter().enumerate() {
                let footnote_references: Vec<String> = cell
                    .footnotes
                    .iter()
                    .filter_map(|symbol| table.footnote_uid_for_symbol(symbol))
                    .map(str::to_string)
                    .collect();

                for cell_ref in &cell.refs {
                    cell_references.push(SoACellReference {
                        row_index,
                        column_index,
                        referenced_item: ReferencedItem {
                            item_uid: cell_ref.uid.clone(),
                            item_type: cell_ref.item_type,
                            item_name: Some(cell.text.clone()),
                        },
                        footnote_references: footnote_references.clone(),
                        row_hidden: row.hide,
                    });
                }
            }
        }

        let footnote_references = table
            .footnotes
            .iter()
            .map(|f| SoAFootnoteReference {
                footnote_uid: f.uid.clone(),
                order_symbol: f.symbol.clone(),
                footnote_text: f.text.clone(),
            })
            .collect();

        Self {
            cell_references,
            footnote_references,
        }
    }
}
