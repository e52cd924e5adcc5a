use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assemble::RectangleRecord;

pub const SENDER_KEYWORDS: [&str; 4] = ["sender", "broker", "zerodha", "from"];
pub const RECEIVER_KEYWORDS: [&str; 4] = ["client", "receiver", "to", "customer"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Sender,
    Receiver,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Sender => write!(f, "sender"),
            Party::Receiver => write!(f, "receiver"),
        }
    }
}

/// A tagged region: its 1-based position in the flattened list and its record.
pub type ClassifiedRegion = (usize, RectangleRecord);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub sender: Vec<ClassifiedRegion>,
    pub receiver: Vec<ClassifiedRegion>,
}

/// Lower-case and collapse runs of whitespace to single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keyword tag for one region's text. Sender keywords are checked first and
/// win outright, so a region never carries both tags.
pub fn party_of(text: &str) -> Option<Party> {
    let text = normalize(text);
    if SENDER_KEYWORDS.iter().any(|k| text.contains(k)) {
        Some(Party::Sender)
    } else if RECEIVER_KEYWORDS.iter().any(|k| text.contains(k)) {
        Some(Party::Receiver)
    } else {
        None
    }
}

pub fn classify(records: &[RectangleRecord]) -> Classification {
    let mut out = Classification::default();
    for (i, record) in records.iter().enumerate() {
        match party_of(&record.text) {
            Some(Party::Sender) => out.sender.push((i + 1, record.clone())),
            Some(Party::Receiver) => out.receiver.push((i + 1, record.clone())),
            None => {}
        }
    }
    out
}
