use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::Phase;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    /// Who produced the line, e.g. a player label or `System`.
    pub source: String,
    pub message: String,
    pub phase: Phase,
    pub day: u32,
}

/// Append-only log of public events, fed to the AI as context.
#[derive(Debug, Clone, Default)]
pub struct GameHistory {
    records: Vec<HistoryRecord>,
}

impl GameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        source: impl Into<String>,
        message: impl Into<String>,
        phase: Phase,
        day: u32,
    ) {
        self.records.push(HistoryRecord {
            timestamp: Utc::now(),
            source: source.into(),
            message: message.into(),
            phase,
            day,
        });
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn records_by_source<'a>(
        &'a self,
        source: &'a str,
    ) -> impl Iterator<Item = &'a HistoryRecord> + 'a {
        self.records.iter().filter(move |r| r.source == source)
    }

    pub fn records_by_day(&self, day: u32) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter().filter(move |r| r.day == day)
    }

    pub fn records_by_phase(&self, phase: Phase) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter().filter(move |r| r.phase == phase)
    }

    pub fn recent(&self, count: usize) -> &[HistoryRecord] {
        let start = self.records.len().saturating_sub(count);
        &self.records[start..]
    }

    pub fn format_text(&self) -> String {
        if self.records.is_empty() {
            return "No events recorded yet.".to_string();
        }
        format_grouped("Game history", &self.records)
    }

    pub fn format_recent(&self, count: usize) -> String {
        let recent = self.recent(count);
        if recent.is_empty() {
            return "No recent events.".to_string();
        }
        format_grouped("Recent events", recent)
    }
}

/// Emits a header whenever day or phase changes between consecutive records.
fn format_grouped(title: &str, records: &[HistoryRecord]) -> String {
    let mut out = format!("[{title}]\n");
    let mut current: Option<(u32, Phase)> = None;

    for record in records {
        let key = (record.day, record.phase);
        if current != Some(key) {
            let _ = write!(out, "\n=== Day {} - {} ===\n", record.day, record.phase);
            current = Some(key);
        }
        let _ = writeln!(out, "{}: {}", record.source, record.message);
    }
    out
}
