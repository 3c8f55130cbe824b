//! Replay a recorded pointer log through the gesture recognizers.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::ValueEnum;
use serde::Serialize;

use pointerflow_common::config::PointerflowConfig;
use pointerflow_model::event::{parse_events, PointerEvent};
use pointerflow_model::signal::Signal;
use pointerflow_recognizers::{pan, pinch, tap};
use pointerflow_stream::{Stream, StreamError, Subject};

use crate::writer::SignalWriter;

/// Recognizers a replay runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GestureSelection {
    Pan,
    Pinch,
    Tap,
    All,
}

impl GestureSelection {
    fn includes(self, other: GestureSelection) -> bool {
        self == GestureSelection::All || self == other
    }
}

pub fn run(
    path: PathBuf,
    gesture: GestureSelection,
    config: PointerflowConfig,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read pointer log {}", path.display()))?;
    let events = parse_events(&content).context("Failed to parse pointer log")?;

    let mut writer = SignalWriter::create(output.as_deref())?;
    writer.write_comment(&format!(
        "pointerflow replay of {} ({gesture:?})",
        path.display()
    ))?;

    tracing::info!(
        events = events.len(),
        gesture = ?gesture,
        "Replaying pointer log"
    );
    let written = replay_events(events, gesture, &config, writer)?;

    match output {
        Some(output) => println!("Wrote {written} signal(s) to {}", output.display()),
        None => tracing::info!(signals = written, "Replay complete"),
    }
    Ok(())
}

fn encode<V: Serialize>(signal: Signal<V>) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&signal)?)
}

/// Push `events` through the selected recognizers, writing every signal in
/// the order it was produced. Returns the number of signals written.
pub fn replay_events(
    events: Vec<PointerEvent>,
    gesture: GestureSelection,
    config: &PointerflowConfig,
    writer: SignalWriter,
) -> anyhow::Result<u64> {
    let subject = Subject::new();
    let source = subject.stream();

    let mut lines: Vec<Stream<String>> = Vec::new();
    if gesture.includes(GestureSelection::Pan) {
        lines.push(pan(&source, &config.pan)?.try_map(encode));
    }
    if gesture.includes(GestureSelection::Pinch) {
        lines.push(pinch(&source, &config.pinch)?.try_map(encode));
    }
    if gesture.includes(GestureSelection::Tap) {
        lines.push(tap(&source, &config.tap)?.try_map(encode));
    }
    let merged = lines
        .into_iter()
        .reduce(|all, next| all.merge(&next))
        .unwrap_or_else(Stream::empty);

    let writer = Rc::new(RefCell::new(writer));
    let failure: Rc<RefCell<Option<StreamError>>> = Rc::new(RefCell::new(None));

    let sink = Rc::clone(&writer);
    let failed = Rc::clone(&failure);
    let subscription = merged
        .try_tap(move |line: &String| -> anyhow::Result<()> {
            sink.borrow_mut().write_line(line)?;
            Ok(())
        })
        .subscribe_with(|_| {}, move |err| *failed.borrow_mut() = Some(err), || {});

    for event in events {
        if subscription.is_closed() {
            break;
        }
        subject.next(event);
    }
    subject.complete();

    if let Some(err) = failure.borrow_mut().take() {
        return Err(anyhow::Error::new(err).context("Replay failed"));
    }

    let mut writer = writer.borrow_mut();
    writer.flush()?;
    Ok(writer.lines_written())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Vec<PointerEvent> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("fixtures")
            .join("gestures")
            .join(name);
        parse_events(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn replay_to_lines(
        events: Vec<PointerEvent>,
        gesture: GestureSelection,
    ) -> Vec<serde_json::Value> {
        let dir = std::env::temp_dir().join(format!("pointerflow_test_replay_{gesture:?}"));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("signals.jsonl");

        let writer = SignalWriter::create(Some(&path)).unwrap();
        let written =
            replay_events(events, gesture, &PointerflowConfig::default(), writer).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len() as u64, written);
        let _ = std::fs::remove_dir_all(&dir);
        lines
    }

    #[test]
    fn test_replay_tap_log() {
        let lines = replay_to_lines(fixture("taps.jsonl"), GestureSelection::Tap);
        assert_eq!(lines.len(), 8);
        assert!(lines.iter().all(|line| line["kind"] == "tap"));
        assert_eq!(lines[3]["value"]["count"], 2);
    }

    #[test]
    fn test_replay_all_interleaves_in_event_order() {
        let lines = replay_to_lines(fixture("pan_right.jsonl"), GestureSelection::All);
        let kinds: Vec<_> = lines
            .iter()
            .map(|line| line["kind"].as_str().unwrap().to_string())
            .collect();
        // The drag starts as a tap press and is cancelled once it moves too
        // far, right as the pan takes over.
        assert_eq!(kinds.first().map(String::as_str), Some("tap"));
        assert!(kinds.iter().any(|kind| kind == "pan"));
        let created: Vec<f64> = lines
            .iter()
            .map(|line| line["created_at"].as_f64().unwrap())
            .collect();
        assert!(created.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
