//! Study design selections that feed the Schedule of Activities
//!
//! A `StudyDesign` is the complete set of flowchart selections of one study
//! version. The live document belongs to the draft; locking a study freezes
//! a copy under the new version number, so historical tables are always
//! built from exactly the selections that existed at lock time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, StudyError};

/// Kinds of selections a table cell can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoAItemType {
    StudyEpoch,
    StudyVisit,
    StudySoAGroup,
    StudyActivityGroup,
    StudyActivitySubGroup,
    StudyActivity,
    StudyActivityInstance,
    StudyActivitySchedule,
}

impl SoAItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoAItemType::StudyEpoch => "StudyEpoch",
            SoAItemType::StudyVisit => "StudyVisit",
            SoAItemType::StudySoAGroup => "StudySoAGroup",
            SoAItemType::StudyActivityGroup => "StudyActivityGroup",
            SoAItemType::StudyActivitySubGroup => "StudyActivitySubGroup",
            SoAItemType::StudyActivity => "StudyActivity",
            SoAItemType::StudyActivityInstance => "StudyActivityInstance",
            SoAItemType::StudyActivitySchedule => "StudyActivitySchedule",
        }
    }
}

impl fmt::Display for SoAItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoAItemType {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "StudyEpoch" => SoAItemType::StudyEpoch,
            "StudyVisit" => SoAItemType::StudyVisit,
            "StudySoAGroup" => SoAItemType::StudySoAGroup,
            "StudyActivityGroup" => SoAItemType::StudyActivityGroup,
            "StudyActivitySubGroup" => SoAItemType::StudyActivitySubGroup,
            "StudyActivity" => SoAItemType::StudyActivity,
            "StudyActivityInstance" => SoAItemType::StudyActivityInstance,
            "StudyActivitySchedule" => SoAItemType::StudyActivitySchedule,
            other => {
                return Err(StudyError::InvalidArgument {
                    reason: format!("unknown SoA item type '{}'", other),
                })
            }
        })
    }
}

/// Unit of the study-day header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Day,
    Week,
}

impl FromStr for TimeUnit {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "days" => Ok(TimeUnit::Day),
            "week" | "weeks" => Ok(TimeUnit::Week),
            other => Err(StudyError::InvalidArgument {
                reason: format!("unknown time unit '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyEpoch {
    pub uid: String,
    /// Controlled term naming the epoch; rendered through `TermLabelLookup`
    pub term_uid: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyVisit {
    pub uid: String,
    pub epoch_uid: String,
    pub order: u32,
    pub name: String,
    pub study_day: Option<i32>,
    pub study_week: Option<i32>,
    /// Allowed deviation in days, negative before the nominal day
    pub window_min: Option<i32>,
    pub window_max: Option<i32>,
    pub show_visit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySoAGroup {
    pub uid: String,
    pub name: String,
    pub order: u32,
    pub show_in_protocol_flowchart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyActivityGroup {
    pub uid: String,
    pub soa_group_uid: String,
    pub name: String,
    pub order: u32,
    pub show_in_protocol_flowchart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyActivitySubGroup {
    pub uid: String,
    pub activity_group_uid: String,
    pub name: String,
    pub order: u32,
    pub show_in_protocol_flowchart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyActivity {
    pub uid: String,
    pub activity_subgroup_uid: String,
    pub name: String,
    pub order: u32,
    pub show_in_protocol_flowchart: bool,
    /// Placeholder for an activity still to be requested from the library
    pub is_request_placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyActivityInstance {
    pub uid: String,
    pub study_activity_uid: String,
    pub name: String,
    pub order: u32,
    pub show_in_protocol_flowchart: bool,
}

/// An activity performed at a visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyActivitySchedule {
    pub uid: String,
    pub study_activity_uid: String,
    pub study_visit_uid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FootnoteTarget {
    pub item_type: SoAItemType,
    pub item_uid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySoAFootnote {
    pub uid: String,
    pub order: u32,
    pub text: String,
    pub referenced_items: Vec<FootnoteTarget>,
}

/// All flowchart selections of one study version
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyDesign {
    pub study_uid: String,
    pub preferred_time_unit: TimeUnit,
    pub epochs: Vec<StudyEpoch>,
    pub visits: Vec<StudyVisit>,
    pub soa_groups: Vec<StudySoAGroup>,
    pub activity_groups: Vec<StudyActivityGroup>,
    pub activity_subgroups: Vec<StudyActivitySubGroup>,
    pub activities: Vec<StudyActivity>,
    pub activity_instances: Vec<StudyActivityInstance>,
    pub schedules: Vec<StudyActivitySchedule>,
    pub footnotes: Vec<StudySoAFootnote>,
}

fn not_found(item_type: SoAItemType, uid: &str) -> StudyError {
    StudyError::ItemNotFound {
        item_type: item_type.to_string(),
        item_uid: uid.to_string(),
    }
}

fn find<'a, T>(
    items: &'a [T],
    uid: &str,
    uid_of: impl Fn(&T) -> &str,
    item_type: SoAItemType,
) -> Result<&'a T> {
    items
        .iter()
        .find(|item| uid_of(item) == uid)
        .ok_or_else(|| not_found(item_type, uid))
}

impl StudyDesign {
    pub fn new(study_uid: impl Into<String>) -> Self {
        Self {
            study_uid: study_uid.into(),
            ..Self::default()
        }
    }

    // ===== Lookups =====

    /// # Errors
    /// `ItemNotFound` if no epoch has this uid.
    pub fn get_epoch(&self, uid: &str) -> Result<&StudyEpoch> {
        find(&self.epochs, uid, |e| e.uid.as_str(), SoAItemType::StudyEpoch)
    }

    /// # Errors
    /// `ItemNotFound` if no visit has this uid.
    pub fn get_visit(&self, uid: &str) -> Result<&StudyVisit> {
        find(&self.visits, uid, |v| v.uid.as_str(), SoAItemType::StudyVisit)
    }

    /// # Errors
    /// `ItemNotFound` if no SoA group has this uid.
    pub fn get_soa_group(&self, uid: &str) -> Result<&StudySoAGroup> {
        find(&self.soa_groups, uid, |g| g.uid.as_str(), SoAItemType::StudySoAGroup)
    }

    /// # Errors
    /// `ItemNotFound` if no activity group has this uid.
    pub fn get_activity_group(&self, uid: &str) -> Result<&StudyActivityGroup> {
        find(
            &self.activity_groups,
            uid,
            |g| g.uid.as_str(),
            SoAItemType::StudyActivityGroup,
        )
    }

    /// # Errors
    /// `ItemNotFound` if no activity subgroup has this uid.
    pub fn get_activity_subgroup(&self, uid: &str) -> Result<&StudyActivitySubGroup> {
        find(
            &self.activity_subgroups,
            uid,
            |g| g.uid.as_str(),
            SoAItemType::StudyActivitySubGroup,
        )
    }

    /// # Errors
    /// `ItemNotFound` if no activity has this uid.
    pub fn get_activity(&self, uid: &str) -> Result<&StudyActivity> {
        find(&self.activities, uid, |a| a.uid.as_str(), SoAItemType::StudyActivity)
    }

    pub fn contains(&self, item_type: SoAItemType, uid: &str) -> bool {
        fn any<T>(items: &[T], uid: &str, uid_of: impl Fn(&T) -> &str) -> bool {
            items.iter().any(|item| uid_of(item) == uid)
        }
        match item_type {
            SoAItemType::StudyEpoch => any(&self.epochs, uid, |x| x.uid.as_str()),
            SoAItemType::StudyVisit => any(&self.visits, uid, |x| x.uid.as_str()),
            SoAItemType::StudySoAGroup => any(&self.soa_groups, uid, |x| x.uid.as_str()),
            SoAItemType::StudyActivityGroup => any(&self.activity_groups, uid, |x| x.uid.as_str()),
            SoAItemType::StudyActivitySubGroup => any(&self.activity_subgroups, uid, |x| x.uid.as_str()),
            SoAItemType::StudyActivity => any(&self.activities, uid, |x| x.uid.as_str()),
            SoAItemType::StudyActivityInstance => any(&self.activity_instances, uid, |x| x.uid.as_str()),
            SoAItemType::StudyActivitySchedule => any(&self.schedules, uid, |x| x.uid.as_str()),
        }
    }

    // ===== Insertion =====
    //
    // Each insert checks the parent link so a design can never hold
    // dangling references when built through these methods.

    pub fn add_epoch(&mut self, epoch: StudyEpoch) -> &mut Self {
        self.epochs.push(epoch);
        self
    }

    /// # Errors
    /// `ItemNotFound` if the visit's epoch is unknown.
    pub fn add_visit(&mut self, visit: StudyVisit) -> Result<&mut Self> {
        self.get_epoch(&visit.epoch_uid)?;
        self.visits.push(visit);
        Ok(self)
    }

    pub fn add_soa_group(&mut self, group: StudySoAGroup) -> &mut Self {
        self.soa_groups.push(group);
        self
    }

    /// # Errors
    /// `ItemNotFound` if the SoA group is unknown.
    pub fn add_activity_group(&mut self, group: StudyActivityGroup) -> Result<&mut Self> {
        self.get_soa_group(&group.soa_group_uid)?;
        self.activity_groups.push(group);
        Ok(self)
    }

    /// # Errors
    /// `ItemNotFound` if the activity group is unknown.
    pub fn add_activity_subgroup(&mut self, subgroup: StudyActivitySubGroup) -> Result<&mut Self> {
        self.get_activity_group(&subgroup.activity_group_uid)?;
        self.activity_subgroups.push(subgroup);
        Ok(self)
    }

    /// # Errors
    /// `ItemNotFound` if the activity subgroup is unknown.
    pub fn add_activity(&mut self, activity: StudyActivity) -> Result<&mut Self> {
        self.get_activity_subgroup(&activity.activity_subgroup_uid)?;
        self.activities.push(activity);
        Ok(self)
    }

    /// # Errors
    /// `ItemNotFound` if the activity is unknown.
    pub fn add_activity_instance(&mut self, instance: StudyActivityInstance) -> Result<&mut Self> {
        self.get_activity(&instance.study_activity_uid)?;
        self.activity_instances.push(instance);
        Ok(self)
    }

    /// # Errors
    /// `ItemNotFound` if the activity or the visit is unknown.
    pub fn add_schedule(&mut self, schedule: StudyActivitySchedule) -> Result<&mut Self> {
        self.get_activity(&schedule.study_activity_uid)?;
        self.get_visit(&schedule.study_visit_uid)?;
        self.schedules.push(schedule);
        Ok(self)
    }

    /// # Errors
    /// `FootnoteTargetNotFound` for the first referenced item that is unknown.
    pub fn add_footnote(&mut self, footnote: StudySoAFootnote) -> Result<&mut Self> {
        check_footnote_targets(self, &footnote)?;
        self.footnotes.push(footnote);
        Ok(self)
    }

    /// Remove a schedule; returns whether it existed
    pub fn remove_schedule(&mut self, uid: &str) -> bool {
        let before = self.schedules.len();
        self.schedules.retain(|s| s.uid != uid);
        self.schedules.len() != before
    }

    /// Check every parent link and footnote target
    ///
    /// Designs deserialized from storage bypass the insert checks; the
    /// builder calls this first.
    ///
    /// # Errors
    /// `ItemNotFound` or `FootnoteTargetNotFound` for the first dangling link.
    pub fn check_references(&self) -> Result<()> {
        for visit in &self.visits {
            self.get_epoch(&visit.epoch_uid)?;
        }
        for group in &self.activity_groups {
            self.get_soa_group(&group.soa_group_uid)?;
        }
        for subgroup in &self.activity_subgroups {
            self.get_activity_group(&subgroup.activity_group_uid)?;
        }
        for activity in &self.activities {
            self.get_activity_subgroup(&activity.activity_subgroup_uid)?;
        }
        for instance in &self.activity_instances {
            self.get_activity(&instance.study_activity_uid)?;
        }
        for schedule in &self.schedules {
            self.get_activity(&schedule.study_activity_uid)?;
            self.get_visit(&schedule.study_visit_uid)?;
        }
        for footnote in &self.footnotes {
            check_footnote_targets(self, footnote)?;
        }
        Ok(())
    }
}

fn check_footnote_targets(design: &StudyDesign, footnote: &StudySoAFootnote) -> Result<()> {
    match footnote
        .referenced_items
        .iter()
        .find(|target| !design.contains(target.item_type, &target.item_uid))
    {
        Some(missing) => Err(StudyError::FootnoteTargetNotFound {
            footnote_uid: footnote.uid.clone(),
            item_type: missing.item_type.to_string(),
            item_uid: missing.item_uid.clone(),
        }),
        None => Ok(()),
    }
}
