//! Rendered Schedule of Activities table
//!
//! Every row has the same number of cells: column 0 holds row labels and
//! columns `1..` are visits. A cell covered by a spanning neighbour has
//! `span == 0`. The first `num_header_rows` rows are headers; the remaining
//! rows form the activity hierarchy, identified by their `level`.

use serde::{Deserialize, Serialize};

use super::design::SoAItemType;

/// Mark placed in a cell where an activity is scheduled
pub const SCHEDULE_MARK: &str = "X";

/// Position of a row in the activity hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RowLevel {
    Header,
    SoAGroup,
    ActivityGroup,
    ActivitySubGroup,
    Activity,
    ActivityInstance,
}

impl RowLevel {
    /// Row level of a body row whose label cell references `item_type`
    pub fn for_label_item(item_type: SoAItemType) -> Option<Self> {
        match item_type {
            SoAItemType::StudySoAGroup => Some(RowLevel::SoAGroup),
            SoAItemType::StudyActivityGroup => Some(RowLevel::ActivityGroup),
            SoAItemType::StudyActivitySubGroup => Some(RowLevel::ActivitySubGroup),
            SoAItemType::StudyActivity => Some(RowLevel::Activity),
            SoAItemType::StudyActivityInstance => Some(RowLevel::ActivityInstance),
            SoAItemType::StudyEpoch
            | SoAItemType::StudyVisit
            | SoAItemType::StudyActivitySchedule => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub item_type: SoAItemType,
    pub uid: String,
}

impl CellRef {
    pub fn new(item_type: SoAItemType, uid: impl Into<String>) -> Self {
        Self {
            item_type,
            uid: uid.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    pub text: String,
    pub span: u32,
    pub refs: Vec<CellRef>,
    /// Footnote symbols, in footnote order
    pub footnotes: Vec<String>,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            text: String::new(),
            span: 1,
            refs: Vec::new(),
            footnotes: Vec::new(),
        }
    }
}

impl TableCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Placeholder for a column covered by a spanning cell on its left
    pub fn covered() -> Self {
        Self {
            span: 0,
            ..Self::default()
        }
    }

    pub fn with_ref(mut self, item_type: SoAItemType, uid: impl Into<String>) -> Self {
        self.refs.push(CellRef::new(item_type, uid));
        self
    }

    pub fn references(&self, item_type: SoAItemType, uid: &str) -> bool {
        self.refs
            .iter()
            .any(|r| r.item_type == item_type && r.uid == uid)
    }

    fn add_footnote(&mut self, symbol: &str) {
        if !self.footnotes.iter().any(|s| s == symbol) {
            self.footnotes.push(symbol.to_string());
        }
    }

    fn add_ref(&mut self, cell_ref: &CellRef) {
        if !self.refs.contains(cell_ref) {
            self.refs.push(cell_ref.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub hide: bool,
    pub level: RowLevel,
}

impl TableRow {
    pub fn new(level: RowLevel, cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            hide: false,
            level,
        }
    }

    pub fn hidden(mut self, hide: bool) -> Self {
        self.hide = hide;
        self
    }

    /// Label of the row (column 0)
    pub fn label(&self) -> &str {
        self.cells.first().map(|c| c.text.as_str()).unwrap_or("")
    }

    /// Whether the row carries anything worth propagating
    pub fn has_marks(&self) -> bool {
        self.cells
            .iter()
            .enumerate()
            .any(|(col, cell)| !cell.footnotes.is_empty() || (col > 0 && !cell.text.is_empty()))
    }

    /// Merge schedule marks and footnote symbols of `source` into this row
    ///
    /// The label text of column 0 is left untouched.
    fn absorb(&mut self, source: &TableRow) {
        for (col, (target, cell)) in self.cells.iter_mut().zip(&source.cells).enumerate() {
            for symbol in &cell.footnotes {
                target.add_footnote(symbol);
            }
            if col == 0 {
                continue;
            }
            if target.text.is_empty() && !cell.text.is_empty() {
                target.text = cell.text.clone();
            }
            for cell_ref in &cell.refs {
                target.add_ref(cell_ref);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaFootnote {
    pub uid: String,
    pub symbol: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaTable {
    pub title: String,
    pub num_header_rows: usize,
    pub num_header_cols: usize,
    pub rows: Vec<TableRow>,
    pub footnotes: Vec<SoaFootnote>,
    pub show_hidden: bool,
}

impl SoaTable {
    pub fn num_columns(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    pub fn header_rows(&self) -> &[TableRow] {
        &self.rows[..self.num_header_rows.min(self.rows.len())]
    }

    pub fn body_rows(&self) -> &[TableRow] {
        &self.rows[self.num_header_rows.min(self.rows.len())..]
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    /// Rows to render, with their indexes
    ///
    /// Hidden rows are skipped unless `show_hidden` is set.
    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &TableRow)> {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, row)| self.show_hidden || !row.hide)
    }

    /// Render hidden rows too; their `hide` flag stays set for styling
    pub fn show_hidden_rows(&mut self) {
        self.show_hidden = true;
    }

    /// Push marks of hidden body rows into visible rows, see
    /// [`propagate_hidden_rows`]
    pub fn propagate_hidden_rows(&mut self) {
        let start = self.num_header_rows.min(self.rows.len());
        propagate_hidden_rows(&mut self.rows[start..]);
    }

    /// Drop hidden body rows
    pub fn remove_hidden_rows(&mut self) {
        let header = self.num_header_rows;
        let mut index = 0;
        self.rows.retain(|row| {
            let keep = index < header || !row.hide;
            index += 1;
            keep
        });
    }

    /// Drop body rows of one hierarchy level
    pub fn remove_rows_at_level(&mut self, level: RowLevel) {
        let header = self.num_header_rows;
        let mut index = 0;
        self.rows.retain(|row| {
            let keep = index < header || row.level != level;
            index += 1;
            keep
        });
    }

    /// Attach `symbol` to every cell referencing the item; returns how many
    /// cells were annotated
    pub fn attach_footnote(&mut self, item_type: SoAItemType, uid: &str, symbol: &str) -> usize {
        let mut attached = 0;
        for cell in self.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
            if cell.references(item_type, uid) {
                cell.add_footnote(symbol);
                attached += 1;
            }
        }
        attached
    }

    /// Symbol -> footnote uid
    pub fn footnote_uid_for_symbol(&self, symbol: &str) -> Option<&str> {
        self.footnotes
            .iter()
            .find(|f| f.symbol == symbol)
            .map(|f| f.uid.as_str())
    }
}

/// Merge schedule marks and footnotes of hidden rows into visible rows
///
/// A hidden row gives its marks to its nearest visible ancestor. When no
/// ancestor is visible, the nearest preceding visible row at the same or a
/// higher level receives them. Failing that, the row is shown again so its
/// marks survive [`SoaTable::remove_hidden_rows`]. Hidden rows are never
/// cleared.
pub fn propagate_hidden_rows(rows: &mut [TableRow]) {
    let mut ancestors: Vec<usize> = Vec::new();

    for i in 0..rows.len() {
        let level = rows[i].level;
        while ancestors.last().is_some_and(|&a| rows[a].level >= level) {
            ancestors.pop();
        }

        if rows[i].hide && rows[i].has_marks() {
            let target = ancestors
                .iter()
                .rev()
                .copied()
                .find(|&a| !rows[a].hide)
                .or_else(|| {
                    (0..i)
                        .rev()
                        .find(|&j| !rows[j].hide && rows[j].level <= level)
                });

            match target {
                Some(target) => {
                    let source = rows[i].clone();
                    rows[target].absorb(&source);
                }
                None => rows[i].hide = false,
            }
        }

        ancestors.push(i);
    }
}

/// Footnote symbol for the footnote at `index`: a..z, aa, ab, ...
pub fn footnote_symbol(index: usize) -> String {
    let mut n = index + 1;
    let mut symbol = Vec::new();
    while n > 0 {
        n -= 1;
        symbol.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    symbol.reverse();
    String::from_utf8_lossy(&symbol).into_owned()
}
