//! Append-only record of everything said on the call.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One final transcript fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    /// Arrival order, starting at 0.
    pub seq: u64,
    pub text: String,
    pub speaker: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TranscriptEntry {
    /// `[speaker]: text`, or bare text when the speaker is unknown.
    pub fn render(&self) -> String {
        match &self.speaker {
            Some(speaker) => format!("[{speaker}]: {}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Ordered transcript of one session.
#[derive(Debug, Default)]
pub struct RollingTranscript {
    entries: Vec<TranscriptEntry>,
    next_seq: u64,
}

impl RollingTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the stored entry.
    pub fn record(&mut self, text: &str, speaker: Option<&str>) -> &TranscriptEntry {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(TranscriptEntry {
            seq,
            text: text.to_string(),
            speaker: speaker.map(str::to_string),
            recorded_at: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// The last `limit` entries rendered one per line, oldest first.
    pub fn window(&self, limit: usize) -> String {
        let start = self.entries.len().saturating_sub(limit);
        render(&self.entries[start..])
    }

    /// Every entry, rendered.
    pub fn render_full(&self) -> String {
        render(&self.entries)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Most recent entry whose speaker passes `pred`.
    pub fn last_matching(&self, pred: impl Fn(Option<&str>) -> bool) -> Option<&TranscriptEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| pred(e.speaker.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_seq = 0;
    }
}

fn render(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(TranscriptEntry::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_follow_arrival() {
        let mut t = RollingTranscript::new();
        t.record("first", Some("hiring_manager"));
        t.record("second", Some("recruiter"));
        t.record("third", None);
        let seqs: Vec<u64> = t.entries().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn window_keeps_most_recent_oldest_first() {
        let mut t = RollingTranscript::new();
        for i in 0..5 {
            t.record(&format!("line {i}"), Some("hm"));
        }
        assert_eq!(t.window(2), "[hm]: line 3\n[hm]: line 4");
        assert_eq!(t.window(50).lines().count(), 5);
        assert_eq!(t.window(0), "");
    }

    #[test]
    fn unlabelled_entries_render_bare() {
        let mut t = RollingTranscript::new();
        t.record("hello there", None);
        assert_eq!(t.render_full(), "hello there");
    }

    #[test]
    fn last_matching_skips_observers() {
        let mut t = RollingTranscript::new();
        t.record("we need Go", Some("hiring_manager"));
        t.record("got it", Some("recruiter"));
        let last = t.last_matching(|s| s != Some("recruiter"));
        assert_eq!(last.map(|e| e.text.as_str()), Some("we need Go"));
    }

    #[test]
    fn clear_restarts_sequence() {
        let mut t = RollingTranscript::new();
        t.record("a", None);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.record("b", None).seq, 0);
        assert_eq!(t.len(), 1);
    }
}
