//! Show pointer log statistics.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::Context;

use pointerflow_common::clock::ms_to_secs;
use pointerflow_model::event::{parse_events, PointerEvent};

/// Aggregate counts over a pointer log.
#[derive(Debug, Default, PartialEq)]
pub struct LogSummary {
    pub events: usize,
    pub phases: BTreeMap<&'static str, usize>,
    pub pointer_types: BTreeMap<&'static str, usize>,
    pub pointer_ids: BTreeSet<i64>,
    pub devices: BTreeSet<String>,
    pub first_time: Option<f64>,
    pub last_time: Option<f64>,
}

impl LogSummary {
    pub fn from_events(events: &[PointerEvent]) -> Self {
        let mut summary = Self {
            events: events.len(),
            ..Default::default()
        };
        for event in events {
            *summary.phases.entry(event.phase.as_str()).or_default() += 1;
            *summary
                .pointer_types
                .entry(event.pointer_type.as_str())
                .or_default() += 1;
            summary.pointer_ids.insert(event.id);
            summary.devices.insert(event.device().to_string());

            let t = event.timestamp;
            summary.first_time = Some(summary.first_time.map_or(t, |first| first.min(t)));
            summary.last_time = Some(summary.last_time.map_or(t, |last| last.max(t)));
        }
        summary
    }

    /// Milliseconds between the earliest and latest event.
    pub fn span_ms(&self) -> f64 {
        match (self.first_time, self.last_time) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read pointer log {}", path.display()))?;
    let events = parse_events(&content).context("Failed to parse pointer log")?;
    let summary = LogSummary::from_events(&events);

    println!("Pointer log: {}", path.display());
    println!("  Events: {}", summary.events);
    println!(
        "  Time span: {:.1} ms ({:.3}s)",
        summary.span_ms(),
        ms_to_secs(summary.span_ms())
    );
    println!();

    println!("Phases:");
    for (phase, count) in &summary.phases {
        println!("  {phase}: {count}");
    }
    println!();

    println!("Pointer types:");
    for (pointer_type, count) in &summary.pointer_types {
        println!("  {pointer_type}: {count}");
    }
    println!();

    println!("Pointers:");
    println!("  Distinct ids: {}", summary.pointer_ids.len());
    println!(
        "  Devices: {}",
        summary.devices.iter().cloned().collect::<Vec<_>>().join(", ")
    );

    Ok(())
}
