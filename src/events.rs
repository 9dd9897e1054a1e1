use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;
use strum::Display;

use crate::types::{AgentId, Step};

/// Cost-bearing encounters recorded against an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Event {
    ScreeningVia,
    ScreeningDna,
    ScreeningCytology,
    ScreeningCancerInspection,
    SurveillanceVia,
    SurveillanceDna,
    SurveillanceCytology,
    SurveillanceCancerInspection,
    TreatmentLeep,
    TreatmentCryo,
}

/// Immutable log entry. Records are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub time: Step,
    pub agent: AgentId,
    pub event: Event,
    pub cost: f64,
}

/// Per-kind totals over a log.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventTotals {
    pub count: usize,
    pub cost: f64,
}

/// Append-only, time-stamped event log.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog::default()
    }

    pub fn record(&mut self, record: EventRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    pub fn for_agent(&self, agent: AgentId) -> impl Iterator<Item = &EventRecord> {
        self.records.iter().filter(move |r| r.agent == agent)
    }

    pub fn total_cost(&self) -> f64 {
        self.records.iter().map(|r| r.cost).sum()
    }

    pub fn totals_by_event(&self) -> BTreeMap<Event, EventTotals> {
        let mut out: BTreeMap<Event, EventTotals> = BTreeMap::new();
        for r in &self.records {
            let t = out.entry(r.event).or_default();
            t.count += 1;
            t.cost += r.cost;
        }
        out
    }

    /// One JSON object per line.
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for r in &self.records {
            serde_json::to_writer(&mut writer, r)?;
            writeln!(writer)?;
        }
        writer.flush()
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a EventRecord;
    type IntoIter = std::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
