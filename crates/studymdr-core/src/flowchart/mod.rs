//! Schedule of Activities
//!
//! - `design`: the flowchart selections of one study version
//! - `labels`: controlled-term label lookup for epoch names
//! - `table`: the rendered table and hidden-row propagation
//! - `builder`: design -> table for each layout

pub mod builder;
pub mod design;
pub mod labels;
pub mod table;

pub use builder::{build_flowchart_table, item_uid_coordinates, FlowchartOptions, SoALayout};
pub use design::{SoAItemType, StudyDesign, TimeUnit};
pub use labels::{CodelistLabels, TermLabelLookup};
pub use table::{propagate_hidden_rows, CellRef, RowLevel, SoaTable, TableCell, TableRow};
