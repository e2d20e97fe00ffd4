// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter.
//!
//! [`export`] writes events from a [`RecorderSink`](super::recorder::RecorderSink)
//! as a pretty-printed JSON array. Each object carries a `seq` number (its
//! position in the recording), the event `name`, the `session` id or `null`,
//! and an `args` object with the event's remaining fields.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::RecordedEvent;

/// Exports recorded events as a JSON array.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let values: Vec<Value> = events
        .iter()
        .enumerate()
        .map(|(seq, event)| to_value(seq, event))
        .collect();

    serde_json::to_writer_pretty(writer, &values)?;
    Ok(())
}

fn to_value(seq: usize, event: &RecordedEvent) -> Value {
    let args = match event {
        RecordedEvent::SessionStart(e) => json!({
            "cause": format!("{:?}", e.cause),
        }),
        RecordedEvent::SessionEnd(e) => json!({
            "cause": format!("{:?}", e.cause),
        }),
        RecordedEvent::Intersection(e) => json!({
            "records": e.records,
            "is_intersecting": e.is_intersecting,
            "intersection_ratio": e.intersection_ratio,
            "stale": e.stale,
        }),
        RecordedEvent::Visibility(e) => json!({
            "cause": format!("{:?}", e.cause),
        }),
        RecordedEvent::ForceCheck(_) => json!({}),
    };

    json!({
        "seq": seq,
        "name": event.name(),
        "session": event.session().map(|id| id.0),
        "args": args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use deferview_core::trace::{
        EndCause, IntersectionEvent, SessionEndEvent, SessionId, SessionStartEvent, StartCause,
        TraceSink, VisibilityCause, VisibilityEvent,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_session_start(&SessionStartEvent {
            session: SessionId(2),
            cause: StartCause::ElementReplaced,
        });
        rec.on_intersection(&IntersectionEvent {
            session: SessionId(2),
            records: 1,
            is_intersecting: Some(true),
            intersection_ratio: Some(0.25),
            stale: false,
        });
        rec.on_visibility(&VisibilityEvent {
            cause: VisibilityCause::Intersection,
            session: Some(SessionId(2)),
        });
        rec.on_session_end(&SessionEndEvent {
            session: SessionId(2),
            cause: EndCause::Latched,
        });

        let mut out = Vec::new();
        export(rec.events(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["seq"], 0);
        assert_eq!(parsed[0]["name"], "SessionStart");
        assert_eq!(parsed[0]["session"], 2);
        assert_eq!(parsed[0]["args"]["cause"], "ElementReplaced");

        assert_eq!(parsed[1]["args"]["is_intersecting"], true);
        assert_eq!(parsed[1]["args"]["intersection_ratio"], 0.25);

        assert_eq!(parsed[2]["name"], "Visibility");
        assert_eq!(parsed[3]["seq"], 3);
        assert_eq!(parsed[3]["args"]["cause"], "Latched");
    }

    #[test]
    fn sessionless_events_export_null() {
        let mut rec = RecorderSink::new();
        rec.on_visibility(&VisibilityEvent {
            cause: VisibilityCause::Initial,
            session: None,
        });
        let mut out = Vec::new();
        export(rec.events(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed[0]["session"].is_null());
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
