//! Two-speaker dialogue parsing and enhancement.

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

pub const SPEAKER_ONE: &str = "Speaker 1";
pub const SPEAKER_TWO: &str = "Speaker 2";

/// Short listener reactions woven into the dialogue
pub const REACTIONS: [&str; 6] = [
    "That's really interesting!",
    "I never thought of it that way.",
    "Wow, I can see why that matters.",
    "That makes a lot of sense.",
    "How does that work exactly?",
    "Can you tell me more about that?",
];

lazy_static! {
    static ref SPEAKER_LINE: Regex =
        Regex::new(r"^(Speaker \d+): (.*)").expect("speaker line pattern is valid");
}

/// One line of dialogue
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub speaker: String,
    pub text: String,
}

impl Turn {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Turn {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// Keeps only lines of the form `Speaker N: text`. Used on model output
/// that was asked for exactly that format.
pub fn parse_strict(text: &str) -> Vec<Turn> {
    text.lines()
        .filter_map(|line| {
            let captures = SPEAKER_LINE.captures(line)?;
            Some(Turn::new(&captures[1], captures[2].trim()))
        })
        .collect()
}

/// Best-effort parse for dialogue with custom speaker names: named lines
/// map onto Speaker 1/2, other `x: y` lines alternate speakers, and bare
/// lines continue the previous turn.
pub fn parse_lenient(text: &str, speaker1_name: &str, speaker2_name: &str) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(&format!("{speaker1_name}:")) {
            turns.push(Turn::new(SPEAKER_ONE, rest.trim()));
        } else if let Some(rest) = line.strip_prefix(&format!("{speaker2_name}:")) {
            turns.push(Turn::new(SPEAKER_TWO, rest.trim()));
        } else if let Some(colon) = line.find(':') {
            // Unknown speaker label: alternate between the two speakers
            let speaker = if turns.len() % 2 == 0 {
                SPEAKER_ONE
            } else {
                SPEAKER_TWO
            };
            turns.push(Turn::new(speaker, line[colon + 1..].trim()));
        } else if let Some(last) = turns.last_mut() {
            // Continuation of the previous turn
            last.text.push(' ');
            last.text.push_str(line);
        } else {
            turns.push(Turn::new(SPEAKER_ONE, line));
        }
    }

    turns
}

/// Inserts a short reaction from the upcoming speaker after every second
/// turn to make the dialogue more conversational.
pub fn enhance_with<R: Rng>(turns: Vec<Turn>, rng: &mut R) -> Vec<Turn> {
    let mut enhanced = Vec::with_capacity(turns.len() + turns.len() / 2);

    for (i, turn) in turns.iter().enumerate() {
        enhanced.push(turn.clone());

        if i + 1 < turns.len() && i % 2 == 1 {
            let reaction = REACTIONS[rng.random_range(0..REACTIONS.len())];
            enhanced.push(Turn::new(turns[i + 1].speaker.clone(), reaction));
        }
    }

    enhanced
}

pub fn enhance(turns: Vec<Turn>) -> Vec<Turn> {
    enhance_with(turns, &mut rand::rng())
}

/// Renders turns back into `Speaker N: text` lines
pub fn to_transcript(turns: &[Turn]) -> String {
    let mut out = String::new();
    for turn in turns {
        out.push_str(&format!("{}: {}\n", turn.speaker, turn.text));
    }
    out
}
