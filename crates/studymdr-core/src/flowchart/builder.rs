//! Builds the SoA table from a study design

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, StudyError};

use super::design::{
    SoAItemType, StudyActivity, StudyActivityGroup, StudyActivityInstance, StudyActivitySubGroup,
    StudyDesign, StudyEpoch, StudySoAGroup, StudyVisit, TimeUnit,
};
use super::labels::TermLabelLookup;
use super::table::{
    footnote_symbol, CellRef, RowLevel, SoaFootnote, SoaTable, TableCell, TableRow,
    SCHEDULE_MARK,
};

/// Number of header rows: epoch, visit, study day/week, visit window
pub const NUM_HEADER_ROWS: usize = 4;

pub const EPOCH_ROW: usize = 0;
pub const VISIT_ROW: usize = 1;
pub const TIME_ROW: usize = 2;
pub const WINDOW_ROW: usize = 3;

pub const VISIT_HEADER: &str = "Visit";
pub const WINDOW_HEADER: &str = "Visit window (days)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoALayout {
    /// Every row, hidden rows shown with their flag
    Detailed,
    /// Hidden rows folded into visible ancestors and removed
    Protocol,
    /// Activity instances carry the schedule marks
    Operational,
}

impl SoALayout {
    pub const ALL: [SoALayout; 3] = [
        SoALayout::Detailed,
        SoALayout::Protocol,
        SoALayout::Operational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoALayout::Detailed => "detailed",
            SoALayout::Protocol => "protocol",
            SoALayout::Operational => "operational",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SoALayout::Detailed => "Detailed SoA",
            SoALayout::Protocol => "Protocol Flowchart",
            SoALayout::Operational => "Operational SoA",
        }
    }
}

impl fmt::Display for SoALayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoALayout {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(SoALayout::Detailed),
            "protocol" => Ok(SoALayout::Protocol),
            "operational" => Ok(SoALayout::Operational),
            other => Err(StudyError::InvalidArgument {
                reason: format!("unknown SoA layout '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowchartOptions {
    pub layout: SoALayout,
    /// Falls back to the design's preferred unit
    pub time_unit: Option<TimeUnit>,
    /// Protocol layout only: drop SoA group rows
    pub hide_soa_groups: bool,
}

impl FlowchartOptions {
    pub fn for_layout(layout: SoALayout) -> Self {
        Self {
            layout,
            time_unit: None,
            hide_soa_groups: false,
        }
    }

    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = Some(time_unit);
        self
    }
}

impl Default for FlowchartOptions {
    fn default() -> Self {
        Self::for_layout(SoALayout::Protocol)
    }
}

pub fn time_header(unit: TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Day => "Study day",
        TimeUnit::Week => "Study week",
    }
}

pub fn visit_time_text(visit: &StudyVisit, unit: TimeUnit) -> String {
    let value = match unit {
        TimeUnit::Day => visit.study_day,
        TimeUnit::Week => visit.study_week,
    };
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// `±2` for symmetric windows, `-1/+3` otherwise
pub fn visit_window_text(visit: &StudyVisit) -> String {
    match (visit.window_min, visit.window_max) {
        (None, None) => String::new(),
        (Some(min), Some(max)) if min == -max && max > 0 => format!("±{}", max),
        (Some(0), Some(0)) => "0".to_string(),
        (min, max) => format!("{}/{:+}", min.unwrap_or(0), max.unwrap_or(0)),
    }
}

/// Ordered selection with a uid tie-breaker
trait Ordered {
    fn order(&self) -> u32;
    fn uid(&self) -> &str;
}

macro_rules! impl_ordered {
    ($($ty:ty),*) => {
        $(impl Ordered for $ty {
            fn order(&self) -> u32 {
                self.order
            }
            fn uid(&self) -> &str {
                &self.uid
            }
        })*
    };
}

impl_ordered!(
    StudyEpoch,
    StudyVisit,
    StudySoAGroup,
    StudyActivityGroup,
    StudyActivitySubGroup,
    StudyActivity,
    StudyActivityInstance
);

fn ordered<'a, T: Ordered>(items: &'a [T], keep: impl Fn(&T) -> bool) -> Vec<&'a T> {
    let mut selected: Vec<&T> = items.iter().filter(|item| keep(item)).collect();
    selected.sort_by(|a, b| (a.order(), a.uid()).cmp(&(b.order(), b.uid())));
    selected
}

/// Visit columns: by epoch order, then visit order within the epoch
fn visit_columns<'a>(design: &'a StudyDesign, layout: SoALayout) -> Vec<&'a StudyVisit> {
    let epoch_rank: HashMap<&str, usize> = ordered(&design.epochs, |_| true)
        .into_iter()
        .enumerate()
        .map(|(rank, epoch)| (epoch.uid.as_str(), rank))
        .collect();

    let mut visits: Vec<&StudyVisit> = design
        .visits
        .iter()
        .filter(|v| layout != SoALayout::Protocol || v.show_visit)
        .collect();
    visits.sort_by(|a, b| {
        let ka = (epoch_rank.get(a.epoch_uid.as_str()), a.order, &a.uid);
        let kb = (epoch_rank.get(b.epoch_uid.as_str()), b.order, &b.uid);
        ka.cmp(&kb)
    });
    visits
}

fn header_rows(
    design: &StudyDesign,
    visits: &[&StudyVisit],
    unit: TimeUnit,
    labels: &dyn TermLabelLookup,
) -> Result<Vec<TableRow>> {
    let mut epoch_cells = vec![TableCell::default()];
    let mut index = 0;
    while index < visits.len() {
        let epoch_uid = &visits[index].epoch_uid;
        let run = visits[index..]
            .iter()
            .take_while(|v| &v.epoch_uid == epoch_uid)
            .count();
        let epoch = design.get_epoch(epoch_uid)?;

        let mut cell = TableCell::new(labels.label_or_uid(&epoch.term_uid))
            .with_ref(SoAItemType::StudyEpoch, &epoch.uid);
        cell.span = run as u32;
        epoch_cells.push(cell);
        epoch_cells.extend((1..run).map(|_| TableCell::covered()));
        index += run;
    }

    let mut visit_cells = vec![TableCell::new(VISIT_HEADER)];
    let mut time_cells = vec![TableCell::new(time_header(unit))];
    let mut window_cells = vec![TableCell::new(WINDOW_HEADER)];
    for visit in visits {
        visit_cells.push(TableCell::new(&visit.name).with_ref(SoAItemType::StudyVisit, &visit.uid));
        time_cells.push(TableCell::new(visit_time_text(visit, unit)));
        window_cells.push(TableCell::new(visit_window_text(visit)));
    }

    Ok(vec![
        TableRow::new(RowLevel::Header, epoch_cells),
        TableRow::new(RowLevel::Header, visit_cells),
        TableRow::new(RowLevel::Header, time_cells),
        TableRow::new(RowLevel::Header, window_cells),
    ])
}

struct BodyBuilder<'a> {
    design: &'a StudyDesign,
    layout: SoALayout,
    columns: HashMap<&'a str, usize>,
    num_columns: usize,
}

impl<'a> BodyBuilder<'a> {
    fn label_row(&self, level: RowLevel, item_type: SoAItemType, uid: &str, name: &str) -> TableRow {
        let mut cells = vec![TableCell::new(name).with_ref(item_type, uid)];
        cells.resize_with(self.num_columns, TableCell::default);
        TableRow::new(level, cells)
    }

    fn mark_schedules(&self, row: &mut TableRow, activity_uid: &str) {
        for schedule in self
            .design
            .schedules
            .iter()
            .filter(|s| s.study_activity_uid == activity_uid)
        {
            // Schedules at visits outside the layout's columns are skipped
            if let Some(&col) = self.columns.get(schedule.study_visit_uid.as_str()) {
                let cell = &mut row.cells[col];
                cell.text = SCHEDULE_MARK.to_string();
                cell.refs.push(CellRef::new(
                    SoAItemType::StudyActivitySchedule,
                    &schedule.uid,
                ));
            }
        }
    }

    fn activity_rows(&self, activity: &StudyActivity) -> Vec<TableRow> {
        let mut activity_row = self
            .label_row(
                RowLevel::Activity,
                SoAItemType::StudyActivity,
                &activity.uid,
                &activity.name,
            )
            .hidden(!activity.show_in_protocol_flowchart);

        let instances = if self.layout == SoALayout::Operational {
            ordered(&self.design.activity_instances, |i| {
                i.study_activity_uid == activity.uid
            })
        } else {
            Vec::new()
        };

        if instances.is_empty() {
            self.mark_schedules(&mut activity_row, &activity.uid);
            return vec![activity_row];
        }

        let mut rows = vec![activity_row];
        for instance in instances {
            let mut row = self
                .label_row(
                    RowLevel::ActivityInstance,
                    SoAItemType::StudyActivityInstance,
                    &instance.uid,
                    &instance.name,
                )
                .hidden(!instance.show_in_protocol_flowchart);
            self.mark_schedules(&mut row, &activity.uid);
            rows.push(row);
        }
        rows
    }

    /// Hierarchy rows; groups without any activity beneath them are omitted
    fn rows(&self) -> Vec<TableRow> {
        let design = self.design;
        let mut rows = Vec::new();

        for soa_group in ordered(&design.soa_groups, |_| true) {
            let mut soa_rows = Vec::new();
            for group in ordered(&design.activity_groups, |g| g.soa_group_uid == soa_group.uid) {
                let mut group_rows = Vec::new();
                for subgroup in ordered(&design.activity_subgroups, |s| {
                    s.activity_group_uid == group.uid
                }) {
                    let mut subgroup_rows = Vec::new();
                    for activity in ordered(&design.activities, |a| {
                        a.activity_subgroup_uid == subgroup.uid
                    }) {
                        if self.layout == SoALayout::Operational && activity.is_request_placeholder
                        {
                            continue;
                        }
                        subgroup_rows.extend(self.activity_rows(activity));
                    }
                    if !subgroup_rows.is_empty() {
                        group_rows.push(
                            self.label_row(
                                RowLevel::ActivitySubGroup,
                                SoAItemType::StudyActivitySubGroup,
                                &subgroup.uid,
                                &subgroup.name,
                            )
                            .hidden(!subgroup.show_in_protocol_flowchart),
                        );
                        group_rows.append(&mut subgroup_rows);
                    }
                }
                if !group_rows.is_empty() {
                    soa_rows.push(
                        self.label_row(
                            RowLevel::ActivityGroup,
                            SoAItemType::StudyActivityGroup,
                            &group.uid,
                            &group.name,
                        )
                        .hidden(!group.show_in_protocol_flowchart),
                    );
                    soa_rows.append(&mut group_rows);
                }
            }
            if !soa_rows.is_empty() {
                rows.push(
                    self.label_row(
                        RowLevel::SoAGroup,
                        SoAItemType::StudySoAGroup,
                        &soa_group.uid,
                        &soa_group.name,
                    )
                    .hidden(!soa_group.show_in_protocol_flowchart),
                );
                rows.append(&mut soa_rows);
            }
        }
        rows
    }
}

/// Build the SoA table of `design` in the requested layout
///
/// Ordering is fully determined by the design: epochs by order, visits by
/// order within their epoch, activities by SoA group, activity group,
/// activity subgroup and activity order (uids break ties). Footnote
/// symbols follow footnote order.
///
/// # Errors
/// `ItemNotFound` / `FootnoteTargetNotFound` for dangling references.
pub fn build_flowchart_table(
    design: &StudyDesign,
    options: &FlowchartOptions,
    labels: &dyn TermLabelLookup,
) -> Result<SoaTable> {
    design.check_references()?;

    let unit = options.time_unit.unwrap_or(design.preferred_time_unit);
    let visits = visit_columns(design, options.layout);

    let body = BodyBuilder {
        design,
        layout: options.layout,
        columns: visits
            .iter()
            .enumerate()
            .map(|(i, v)| (v.uid.as_str(), i + 1))
            .collect(),
        num_columns: visits.len() + 1,
    };

    let mut rows = header_rows(design, &visits, unit, labels)?;
    rows.extend(body.rows());

    let mut table = SoaTable {
        title: options.layout.title().to_string(),
        num_header_rows: NUM_HEADER_ROWS,
        num_header_cols: 1,
        rows,
        footnotes: Vec::new(),
        show_hidden: false,
    };

    let mut footnotes: Vec<_> = design.footnotes.iter().collect();
    footnotes.sort_by(|a, b| (a.order, &a.uid).cmp(&(b.order, &b.uid)));
    for (index, footnote) in footnotes.into_iter().enumerate() {
        let symbol = footnote_symbol(index);
        for target in &footnote.referenced_items {
            table.attach_footnote(target.item_type, &target.item_uid, &symbol);
        }
        table.footnotes.push(SoaFootnote {
            uid: footnote.uid.clone(),
            symbol,
            text: footnote.text.clone(),
        });
    }

    match options.layout {
        SoALayout::Detailed | SoALayout::Operational => table.show_hidden_rows(),
        SoALayout::Protocol => {
            // Dropped group rows must not receive propagated marks
            if options.hide_soa_groups {
                table.remove_rows_at_level(RowLevel::SoAGroup);
            }
            table.propagate_hidden_rows();
            table.remove_hidden_rows();
        }
    }

    Ok(table)
}

/// Item uid -> (row, column) of the first cell referencing it
pub fn item_uid_coordinates(table: &SoaTable) -> BTreeMap<String, (usize, usize)> {
    let mut coordinates = BTreeMap::new();
    for (row_index, row) in table.rows.iter().enumerate() {
        for (col_index, cell) in row.cells.iter().enumerate() {
            for cell_ref in &cell.refs {
                coordinates
                    .entry(cell_ref.uid.clone())
                    .or_insert((row_index, col_index));
            }
        }
    }
    coordinates
}
