use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::form::TaskPatch;

/// Server-assigned task identity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(TaskId)
            .map_err(|_| anyhow!("Invalid task id: '{}'", s))
    }
}

/// Task lifecycle. Declaration order is board column order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "Work In Progress")]
    WorkInProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Expired")]
    Expired,
}

impl Default for Status {
    fn default() -> Self {
        Status::ToDo
    }
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::ToDo,
        Status::WorkInProgress,
        Status::Completed,
        Status::Expired,
    ];

    /// Wire label, also what the board matches against.
    pub fn label(self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::WorkInProgress => "Work In Progress",
            Status::Completed => "Completed",
            Status::Expired => "Expired",
        }
    }

    /// Exact label match only. Anything else is an unrecognized status.
    pub fn from_label(label: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Column accent as an RGB triple.
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Status::ToDo => (0x00, 0x88, 0xFE),
            Status::WorkInProgress => (0xFF, 0xBB, 0x28),
            Status::Completed => (0x00, 0xC4, 0x9F),
            Status::Expired => (0xF7, 0x37, 0x4F),
        }
    }

    /// Lenient parser for typed input: case-insensitive label, a few short
    /// aliases, or a unique prefix.
    pub fn parse_loose(input: &str) -> Result<Status> {
        let needle = input.trim().to_lowercase();
        match needle.as_str() {
            "todo" | "to-do" | "td" => return Ok(Status::ToDo),
            "wip" | "doing" | "in-progress" | "progress" => return Ok(Status::WorkInProgress),
            "done" => return Ok(Status::Completed),
            _ => {}
        }

        if let Some(status) = Status::ALL
            .into_iter()
            .find(|s| s.label().to_lowercase() == needle)
        {
            return Ok(status);
        }

        let matches: Vec<Status> = Status::ALL
            .into_iter()
            .filter(|s| !needle.is_empty() && s.label().to_lowercase().starts_with(&needle))
            .collect();

        match matches.len() {
            1 => Ok(matches[0]),
            0 => Err(anyhow!("Unknown status: '{}'", input)),
            _ => Err(anyhow!("Ambiguous status: '{}' matches {:?}", input, matches)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn from_label(label: &str) -> Option<Priority> {
        match label {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Priority::Low => (0x00, 0xC4, 0x9F),
            Priority::Medium => (0x00, 0x88, 0xFE),
            Priority::High => (0xF7, 0x37, 0x4F),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A task as the server represents it.
///
/// `status` and `priority` keep the raw strings the server sent: an
/// unrecognized status must survive so the board can leave it out while the
/// table still shows it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: String,
    #[serde(
        default,
        deserialize_with = "deserialize_calendar_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "deserialize_calendar_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            status: Some(Status::default().label().to_string()),
            priority: Priority::default().label().to_string(),
            start_date: None,
            due_date: None,
        }
    }

    /// The recognized status, if any.
    pub fn status(&self) -> Option<Status> {
        self.status.as_deref().and_then(Status::from_label)
    }

    /// Status for views that never drop a task.
    pub fn status_or_default(&self) -> Status {
        self.status().unwrap_or_default()
    }

    pub fn priority(&self) -> Priority {
        Priority::from_label(&self.priority).unwrap_or_default()
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status.label().to_string());
    }

    /// Overlay the server's copy onto this one. Fields the server left out
    /// keep their local value, like a shallow object spread.
    pub fn merge_from(&mut self, server: Task) {
        self.id = server.id;
        if !server.title.is_empty() {
            self.title = server.title;
        }
        if server.description.is_some() {
            self.description = server.description;
        }
        if server.status.is_some() {
            self.status = server.status;
        }
        if !server.priority.is_empty() {
            self.priority = server.priority;
        }
        if server.start_date.is_some() {
            self.start_date = server.start_date;
        }
        if server.due_date.is_some() {
            self.due_date = server.due_date;
        }
    }

    /// Overlay for the reply to a full-form edit. A date the edit sent as
    /// `null` stays cleared unless the server returned one.
    pub fn merge_edit(&mut self, server: Task, patch: &TaskPatch) {
        let (start, due) = (server.start_date, server.due_date);
        self.merge_from(server);
        if patch.start_date == Some(None) && start.is_none() {
            self.start_date = None;
        }
        if patch.due_date == Some(None) && due.is_none() {
            self.due_date = None;
        }
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, normalized to a UTC date.
fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_calendar_date(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: '{}'", s))),
    }
}

pub(crate) fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc().date())
}
