use crate::types::{DecisionResult, FrameSample};

pub const NEUTRAL_LABEL: &str = "neutral";
pub const PRIMARY_EMOTIONS: [&str; 5] = ["angry", "fear", "happy", "sad", "surprise"];

pub const LOCK_CONF: f32 = 0.35;
pub const LOCK_CONSEC: u32 = 7;

// Fraction of the window trimmed from each end before voting.
const CORE_TRIM: f64 = 0.20;
const NEUTRAL_WEIGHT: f64 = 0.001;

pub fn is_primary(label: &str) -> bool {
    PRIMARY_EMOTIONS.contains(&label)
}

/// Consecutive same-label high-confidence ticks. A streak of `LOCK_CONSEC`
/// qualifying ticks ends the capture window early.
#[derive(Debug, Default)]
pub struct StreakTracker {
    label: Option<String>,
    count: u32,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one tick; returns true once the streak qualifies for a lock.
    pub fn observe(&mut self, label: &str, confidence: f32) -> bool {
        let lockable = is_primary(label) && confidence >= LOCK_CONF;
        if !lockable {
            self.label = None;
            self.count = 0;
            return false;
        }

        if self.label.as_deref() == Some(label) {
            self.count += 1;
        } else {
            self.label = Some(label.to_string());
            self.count = 1;
        }

        self.count >= LOCK_CONSEC
    }

    #[allow(dead_code)]
    pub fn count(&self) -> u32 {
        self.count
    }
}

struct VoteEntry {
    label: String,
    weighted: f64,
    confidence_sum: f32,
    frames: u32,
}

/// Windowed majority vote over the middle 60% of the history. Lead-in and
/// lead-out frames are trimmed (the expression may still be transitioning)
/// and neutral votes barely count, so a brief neutral blink cannot dominate
/// a window that is mostly a strong emotion.
pub fn decide(history: &[FrameSample]) -> Option<DecisionResult> {
    if history.is_empty() {
        return None;
    }

    let n = history.len();
    let i0 = (n as f64 * CORE_TRIM).floor() as usize;
    let i1 = ((n as f64) * (1.0 - CORE_TRIM)).ceil() as usize;
    let core = &history[i0..i1];

    // First-encounter order; the stable sort below makes ties deterministic.
    let mut votes: Vec<VoteEntry> = Vec::new();
    for sample in core {
        let weight = if sample.label == NEUTRAL_LABEL {
            NEUTRAL_WEIGHT
        } else {
            1.0
        };
        match votes.iter_mut().find(|v| v.label == sample.label) {
            Some(entry) => {
                entry.weighted += weight;
                entry.confidence_sum += sample.confidence;
                entry.frames += 1;
            }
            None => votes.push(VoteEntry {
                label: sample.label.clone(),
                weighted: weight,
                confidence_sum: sample.confidence,
                frames: 1,
            }),
        }
    }

    votes.sort_by(|a, b| {
        b.weighted
            .partial_cmp(&a.weighted)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let chosen = votes
        .iter()
        .find(|v| v.label != NEUTRAL_LABEL)
        .or_else(|| votes.first())?;

    Some(DecisionResult {
        label: chosen.label.clone(),
        confidence: chosen.confidence_sum / chosen.frames as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sample(label: &str, confidence: f32) -> FrameSample {
        FrameSample {
            timestamp: Instant::now(),
            label: label.to_string(),
            confidence,
        }
    }

    #[test]
    fn streak_locks_after_seven_qualifying_ticks() {
        let mut streak = StreakTracker::new();
        for _ in 0..6 {
            assert!(!streak.observe("happy", 0.5));
        }
        assert!(streak.observe("happy", 0.5));
    }

    #[test]
    fn streak_restarts_on_label_change() {
        let mut streak = StreakTracker::new();
        for _ in 0..6 {
            streak.observe("happy", 0.9);
        }
        assert!(!streak.observe("sad", 0.9));
        assert_eq!(streak.count(), 1);
    }

    #[test]
    fn streak_resets_on_neutral_or_low_confidence() {
        let mut streak = StreakTracker::new();
        streak.observe("happy", 0.9);
        streak.observe("happy", 0.9);
        assert!(!streak.observe("neutral", 0.99));
        assert_eq!(streak.count(), 0);

        streak.observe("angry", 0.9);
        assert!(!streak.observe("angry", LOCK_CONF - 0.01));
        assert_eq!(streak.count(), 0);
    }

    #[test]
    fn streak_requires_consecutive_ticks_of_one_label() {
        let mut streak = StreakTracker::new();
        for i in 0..20 {
            let label = if i % 2 == 0 { "happy" } else { "sad" };
            assert!(!streak.observe(label, 0.9));
        }
    }

    #[test]
    fn decide_picks_majority_in_core_window() {
        // 10 samples: indices 2..8 form the core; the edges must be ignored.
        let mut history = vec![sample("fear", 0.9), sample("fear", 0.9)];
        history.extend([
            sample("happy", 0.9),
            sample("happy", 0.8),
            sample("neutral", 0.99),
            sample("happy", 0.85),
            sample("sad", 0.6),
            sample("happy", 0.7),
        ]);
        history.extend([sample("fear", 0.9), sample("fear", 0.9)]);

        let result = decide(&history).unwrap();
        assert_eq!(result.label, "happy");
        assert!((result.confidence - 0.8125).abs() < 1e-6);
    }

    #[test]
    fn decide_never_picks_neutral_over_a_primary_vote() {
        let history: Vec<FrameSample> = std::iter::repeat_with(|| sample("neutral", 0.99))
            .take(9)
            .chain(std::iter::once(sample("happy", 0.3)))
            .collect();
        // Shuffle the single happy vote into the core window.
        let mut history = history;
        history.swap(4, 9);

        let result = decide(&history).unwrap();
        assert_eq!(result.label, "happy");
        assert!((result.confidence - 0.3).abs() < 1e-6);
    }

    #[test]
    fn decide_falls_back_to_neutral_when_core_is_all_neutral() {
        let history: Vec<FrameSample> = (0..10).map(|_| sample("neutral", 0.8)).collect();
        let result = decide(&history).unwrap();
        assert_eq!(result.label, NEUTRAL_LABEL);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn decide_handles_single_sample_history() {
        let result = decide(&[sample("surprise", 0.4)]).unwrap();
        assert_eq!(result.label, "surprise");
        assert!((result.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn decide_returns_none_on_empty_history() {
        assert!(decide(&[]).is_none());
    }

    #[test]
    fn decide_is_deterministic() {
        let history: Vec<FrameSample> = (0..17)
            .map(|i| {
                let label = PRIMARY_EMOTIONS[i % PRIMARY_EMOTIONS.len()];
                sample(label, 0.2 + (i as f32) * 0.04)
            })
            .collect();

        let first = decide(&history).unwrap();
        for _ in 0..10 {
            assert_eq!(decide(&history).unwrap(), first);
        }
    }
}
