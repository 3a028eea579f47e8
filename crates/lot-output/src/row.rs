//! Plain data row types written by the CSV outputs.

use lot_motion::TravelRecord;

/// One agent assignment, as written to the assignment log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRow {
    pub run_id:       String,
    pub agent_id:     u32,
    pub row:          i32,
    pub col:          i32,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl AssignmentRow {
    pub const HEADER: [&'static str; 5] = ["run_id", "agent_id", "row", "col", "timestamp_ms"];

    pub fn fields(&self) -> [String; 5] {
        [
            self.run_id.clone(),
            self.agent_id.to_string(),
            self.row.to_string(),
            self.col.to_string(),
            self.timestamp_ms.to_string(),
        ]
    }
}

/// One completed leg, as written by
/// [`write_completion_stats`][crate::write_completion_stats].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRow {
    pub agent_id:        u32,
    pub admission_index: usize,
    pub class:           &'static str,
    pub leg:             &'static str,
    pub elapsed_ticks:   u64,
    pub delay_ticks:     u64,
    pub replanned:       bool,
}

impl CompletionRow {
    pub const HEADER: [&'static str; 7] = [
        "agent_id",
        "admission_index",
        "class",
        "leg",
        "elapsed_ticks",
        "delay_ticks",
        "replanned",
    ];

    pub fn fields(&self) -> [String; 7] {
        [
            self.agent_id.to_string(),
            self.admission_index.to_string(),
            self.class.to_owned(),
            self.leg.to_owned(),
            self.elapsed_ticks.to_string(),
            self.delay_ticks.to_string(),
            (self.replanned as u8).to_string(),
        ]
    }
}

impl From<&TravelRecord> for CompletionRow {
    fn from(r: &TravelRecord) -> Self {
        Self {
            agent_id:        r.agent.0,
            admission_index: r.admission_index,
            class:           r.class.as_str(),
            leg:             r.leg.as_str(),
            elapsed_ticks:   r.elapsed_ticks,
            delay_ticks:     r.delay_ticks,
            replanned:       r.replanned,
        }
    }
}
