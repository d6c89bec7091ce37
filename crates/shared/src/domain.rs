use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Covenant {
    Old,
    New,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Canon {
    Protestant,
    Catholic,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Book {
    pub name: String,
    pub abbreviation: String,
    pub chapters: u16,
    pub covenant: Covenant,
}

impl Book {
    pub fn new(
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        chapters: u16,
        covenant: Covenant,
    ) -> Self {
        Self {
            name: name.into(),
            abbreviation: abbreviation.into(),
            chapters,
            covenant,
        }
    }

    pub fn contains_chapter(&self, chapter: u16) -> bool {
        (1..=self.chapters).contains(&chapter)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Translation {
    /// Károli Gáspár revised translation.
    Kg,
    /// Revideált új fordítás.
    #[default]
    Ruf,
    /// Káldi-Neovulgáta.
    Knb,
    /// Szent István Társulat translation.
    Szit,
}

impl Translation {
    pub const ALL: [Translation; 4] = [
        Translation::Kg,
        Translation::Ruf,
        Translation::Knb,
        Translation::Szit,
    ];

    pub fn canon(self) -> Canon {
        match self {
            Translation::Kg | Translation::Ruf => Canon::Protestant,
            Translation::Knb | Translation::Szit => Canon::Catholic,
        }
    }

    /// Code the remote API expects in chapter URLs.
    pub fn code(self) -> &'static str {
        match self {
            Translation::Kg => "KG",
            Translation::Ruf => "RUF",
            Translation::Knb => "KNB",
            Translation::Szit => "SZIT",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Translation::Kg => "Károli Gáspár revideált fordítása",
            Translation::Ruf => "Revideált új fordítás",
            Translation::Knb => "Káldi-Neovulgáta",
            Translation::Szit => "Szent István Társulati Biblia",
        }
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown translation code '{0}'")]
pub struct UnknownTranslation(pub String);

impl FromStr for Translation {
    type Err = UnknownTranslation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Translation::ALL
            .into_iter()
            .find(|tr| tr.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTranslation(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseLocation {
    /// Corpus-wide verse id, identical across translations.
    pub global_index: u64,
    /// Human readable reference such as `Jn 3,16`.
    pub reference: String,
}

impl VerseLocation {
    pub fn chapter(&self) -> Option<u16> {
        self.chapter_and_verse().map(|(chapter, _)| chapter)
    }

    pub fn verse_number(&self) -> Option<u16> {
        self.chapter_and_verse().map(|(_, verse)| verse)
    }

    fn chapter_and_verse(&self) -> Option<(u16, u16)> {
        let (_, numbers) = self.reference.trim().rsplit_once(char::is_whitespace)?;
        let (chapter, verse) = numbers.split_once(',')?;
        Some((chapter.parse().ok()?, verse.parse().ok()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub location: VerseLocation,
    pub text: String,
}

impl Verse {
    pub fn global_index(&self) -> u64 {
        self.location.global_index
    }

    pub fn is_same_verse(&self, other: &Verse) -> bool {
        self.location.global_index == other.location.global_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkColor {
    Yellow,
    Red,
    Blue,
    Green,
    Gray,
}

impl MarkColor {
    /// Fixed order used for loading and saving marking lists.
    pub const ALL: [MarkColor; 5] = [
        MarkColor::Yellow,
        MarkColor::Red,
        MarkColor::Blue,
        MarkColor::Green,
        MarkColor::Gray,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkColor::Yellow => "Yellow",
            MarkColor::Red => "Red",
            MarkColor::Blue => "Blue",
            MarkColor::Green => "Green",
            MarkColor::Gray => "Gray",
        }
    }

    pub fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MarkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown marking color '{0}'")]
pub struct UnknownColor(pub String);

impl FromStr for MarkColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkColor::ALL
            .into_iter()
            .find(|color| color.name() == s)
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}
