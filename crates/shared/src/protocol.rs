//! Wire format of the remote chapter API (`/idezet/{reference}/{translation}`).

use serde::{Deserialize, Serialize};

use crate::domain::{Verse, VerseLocation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterResponse {
    #[serde(rename = "valasz")]
    pub answer: ChapterAnswer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterAnswer {
    #[serde(rename = "versek", default)]
    pub verses: Vec<WireVerse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireVerse {
    #[serde(rename = "szoveg")]
    pub text: String,
    #[serde(rename = "hely")]
    pub location: WireLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireLocation {
    #[serde(rename = "gepi")]
    pub global_index: u64,
    #[serde(rename = "szep")]
    pub reference: String,
}

impl From<WireVerse> for Verse {
    fn from(value: WireVerse) -> Self {
        Self {
            location: VerseLocation {
                global_index: value.location.global_index,
                reference: value.location.reference,
            },
            text: value.text,
        }
    }
}

impl ChapterResponse {
    pub fn into_verses(self) -> Vec<Verse> {
        self.answer.verses.into_iter().map(Verse::from).collect()
    }
}
