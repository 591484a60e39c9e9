use std::time::Instant;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

/// One successful inference tick inside a capture window.
#[derive(Clone, Debug)]
pub struct FrameSample {
    #[allow(dead_code)]
    pub timestamp: Instant,
    pub label: String,
    pub confidence: f32,
}

/// Terminal output of one capture attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionResult {
    pub label: String,
    pub confidence: f32,
}

impl DecisionResult {
    pub fn display_text(&self) -> String {
        format!("{} ({:.0}%)", self.label, self.confidence * 100.0)
    }
}

/// A wizard answer. Radio questions yield `Choice`, free-text questions
/// yield `Text`, the color question yields `ColorText`.
#[derive(Clone, Debug, PartialEq)]
pub enum Answer {
    Choice(String),
    Text(String),
    ColorText { color: String, text: String },
}

/// Completed wizard output, ordered by question.
pub type AnswerSet = Vec<(String, Answer)>;
