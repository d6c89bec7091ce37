//! Canon catalog: the books of each canon and the cross-canon alignment table.
//!
//! Each canon exposes its books in reading order and an abbreviation column.
//! The two columns have one row per logical book, so position `i` in the
//! protestant column and position `i` in the catholic column name the same
//! book. Rows a canon does not contain carry the other canon's abbreviation,
//! which resolves to no book of that canon.

use std::{collections::HashSet, sync::LazyLock};

use thiserror::Error;

use crate::domain::{Book, Canon, Covenant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{canon:?} canon has no books")]
    EmptyCanon { canon: Canon },
    #[error("book '{name}' must have at least one chapter")]
    NoChapters { name: String },
    #[error("abbreviation '{abbreviation}' appears more than once in the {canon:?} canon")]
    DuplicateAbbreviation { canon: Canon, abbreviation: String },
    #[error("abbreviation columns differ in length: protestant {protestant}, catholic {catholic}")]
    MisalignedColumns { protestant: usize, catholic: usize },
}

#[derive(Debug, Clone)]
pub struct Catalog {
    protestant_books: Vec<Book>,
    catholic_books: Vec<Book>,
    protestant_abbreviations: Vec<String>,
    catholic_abbreviations: Vec<String>,
}

static STANDARD: LazyLock<Catalog> = LazyLock::new(Catalog::from_rows);

impl Catalog {
    pub fn new(
        protestant_books: Vec<Book>,
        catholic_books: Vec<Book>,
        protestant_abbreviations: Vec<String>,
        catholic_abbreviations: Vec<String>,
    ) -> Result<Self, CatalogError> {
        if protestant_abbreviations.len() != catholic_abbreviations.len() {
            return Err(CatalogError::MisalignedColumns {
                protestant: protestant_abbreviations.len(),
                catholic: catholic_abbreviations.len(),
            });
        }
        for (canon, books) in [
            (Canon::Protestant, &protestant_books),
            (Canon::Catholic, &catholic_books),
        ] {
            validate_books(canon, books)?;
        }

        Ok(Self {
            protestant_books,
            catholic_books,
            protestant_abbreviations,
            catholic_abbreviations,
        })
    }

    /// The built-in Hungarian catalog, shared for the whole process.
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    pub fn books_of(&self, canon: Canon) -> &[Book] {
        match canon {
            Canon::Protestant => &self.protestant_books,
            Canon::Catholic => &self.catholic_books,
        }
    }

    pub fn abbreviations_of(&self, canon: Canon) -> &[String] {
        match canon {
            Canon::Protestant => &self.protestant_abbreviations,
            Canon::Catholic => &self.catholic_abbreviations,
        }
    }

    pub fn book_by_abbreviation(&self, canon: Canon, abbreviation: &str) -> Option<&Book> {
        self.books_of(canon)
            .iter()
            .find(|book| book.abbreviation == abbreviation)
    }

    pub fn first_book(&self, canon: Canon) -> &Book {
        // Construction rejects empty canons.
        &self.books_of(canon)[0]
    }

    pub fn contains(&self, canon: Canon, book: &Book) -> bool {
        self.books_of(canon).iter().any(|candidate| candidate == book)
    }

    fn from_rows() -> Self {
        let mut catalog = Self {
            protestant_books: Vec::new(),
            catholic_books: Vec::new(),
            protestant_abbreviations: Vec::new(),
            catholic_abbreviations: Vec::new(),
        };

        for (covenant, rows) in [
            (Covenant::Old, OLD_TESTAMENT),
            (Covenant::New, NEW_TESTAMENT),
        ] {
            for row in rows {
                let catholic = row.catholic.to_book(covenant);
                match &row.protestant {
                    Some(entry) => {
                        catalog
                            .protestant_abbreviations
                            .push(entry.abbreviation.to_string());
                        catalog.protestant_books.push(entry.to_book(covenant));
                    }
                    None => catalog
                        .protestant_abbreviations
                        .push(catholic.abbreviation.clone()),
                }
                catalog
                    .catholic_abbreviations
                    .push(catholic.abbreviation.clone());
                catalog.catholic_books.push(catholic);
            }
        }

        catalog
    }
}

fn validate_books(canon: Canon, books: &[Book]) -> Result<(), CatalogError> {
    if books.is_empty() {
        return Err(CatalogError::EmptyCanon { canon });
    }
    let mut seen = HashSet::new();
    for book in books {
        if book.chapters == 0 {
            return Err(CatalogError::NoChapters {
                name: book.name.clone(),
            });
        }
        if !seen.insert(book.abbreviation.as_str()) {
            return Err(CatalogError::DuplicateAbbreviation {
                canon,
                abbreviation: book.abbreviation.clone(),
            });
        }
    }
    Ok(())
}

struct Entry {
    abbreviation: &'static str,
    name: &'static str,
    chapters: u16,
}

impl Entry {
    fn to_book(&self, covenant: Covenant) -> Book {
        Book::new(self.name, self.abbreviation, self.chapters, covenant)
    }
}

struct Row {
    protestant: Option<Entry>,
    catholic: Entry,
}

const fn entry(abbreviation: &'static str, name: &'static str, chapters: u16) -> Entry {
    Entry {
        abbreviation,
        name,
        chapters,
    }
}

const fn same(abbreviation: &'static str, name: &'static str, chapters: u16) -> Row {
    Row {
        protestant: Some(entry(abbreviation, name, chapters)),
        catholic: entry(abbreviation, name, chapters),
    }
}

const fn both(protestant: Entry, catholic: Entry) -> Row {
    Row {
        protestant: Some(protestant),
        catholic,
    }
}

const fn catholic_only(abbreviation: &'static str, name: &'static str, chapters: u16) -> Row {
    Row {
        protestant: None,
        catholic: entry(abbreviation, name, chapters),
    }
}

const OLD_TESTAMENT: &[Row] = &[
    both(entry("1Móz", "1 Mózes", 50), entry("Ter", "Teremtés", 50)),
    both(entry("2Móz", "2 Mózes", 40), entry("Kiv", "Kivonulás", 40)),
    both(entry("3Móz", "3 Mózes", 27), entry("Lev", "Leviták", 27)),
    both(entry("4Móz", "4 Mózes", 36), entry("Szám", "Számok", 36)),
    both(
        entry("5Móz", "5 Mózes", 34),
        entry("MTörv", "Második Törvénykönyv", 34),
    ),
    both(entry("Józs", "Józsué", 24), entry("Józs", "Józsue", 24)),
    same("Bír", "Bírák", 21),
    both(entry("Ruth", "Ruth", 4), entry("Rut", "Rut", 4)),
    same("1Sám", "1 Sámuel", 31),
    same("2Sám", "2 Sámuel", 24),
    same("1Kir", "1 Királyok", 22),
    same("2Kir", "2 Királyok", 25),
    same("1Krón", "1 Krónikák", 29),
    same("2Krón", "2 Krónikák", 36),
    both(entry("Ezsd", "Ezsdrás", 10), entry("Ezd", "Ezdrás", 10)),
    same("Neh", "Nehémiás", 13),
    catholic_only("Tób", "Tóbiás", 14),
    catholic_only("Jud", "Judit", 16),
    same("Eszt", "Eszter", 10),
    catholic_only("1Mak", "1 Makkabeusok", 16),
    catholic_only("2Mak", "2 Makkabeusok", 15),
    same("Jób", "Jób", 42),
    same("Zsolt", "Zsoltárok", 150),
    same("Péld", "Példabeszédek", 31),
    same("Préd", "Prédikátor", 12),
    both(
        entry("Énekek", "Énekek éneke", 8),
        entry("Én", "Énekek éneke", 8),
    ),
    catholic_only("Bölcs", "Bölcsesség", 19),
    catholic_only("Sir", "Sirák fia", 51),
    both(entry("Ézs", "Ézsaiás", 66), entry("Iz", "Izajás", 66)),
    same("Jer", "Jeremiás", 52),
    both(
        entry("JSir", "Jeremiás siralmai", 5),
        entry("Siral", "Siralmak", 5),
    ),
    catholic_only("Bár", "Báruk", 6),
    same("Ez", "Ezékiel", 48),
    both(entry("Dán", "Dániel", 12), entry("Dán", "Dániel", 14)),
    both(entry("Hós", "Hóseás", 14), entry("Oz", "Ozeás", 14)),
    both(entry("Jóel", "Jóel", 3), entry("Jo", "Joel", 4)),
    both(entry("Ám", "Ámósz", 9), entry("Ám", "Ámosz", 9)),
    same("Abd", "Abdiás", 1),
    same("Jón", "Jónás", 4),
    same("Mik", "Mikeás", 7),
    same("Náh", "Náhum", 3),
    same("Hab", "Habakuk", 3),
    both(entry("Zof", "Zofóniás", 3), entry("Szof", "Szofoniás", 3)),
    both(entry("Hag", "Haggeus", 2), entry("Agg", "Aggeus", 2)),
    same("Zak", "Zakariás", 14),
    both(entry("Mal", "Malakiás", 4), entry("Mal", "Malakiás", 3)),
];

const NEW_TESTAMENT: &[Row] = &[
    same("Mt", "Máté", 28),
    same("Mk", "Márk", 16),
    same("Lk", "Lukács", 24),
    same("Jn", "János", 21),
    same("ApCsel", "Apostolok cselekedetei", 28),
    same("Róm", "Rómaiakhoz", 16),
    same("1Kor", "1 Korinthusiakhoz", 16),
    same("2Kor", "2 Korinthusiakhoz", 13),
    same("Gal", "Galatákhoz", 6),
    same("Ef", "Efezusiakhoz", 6),
    same("Fil", "Filippiekhez", 4),
    same("Kol", "Kolosséiakhoz", 4),
    both(
        entry("1Thessz", "1 Thesszalonikaiakhoz", 5),
        entry("1Tesz", "1 Tesszalonikaiakhoz", 5),
    ),
    both(
        entry("2Thessz", "2 Thesszalonikaiakhoz", 3),
        entry("2Tesz", "2 Tesszalonikaiakhoz", 3),
    ),
    same("1Tim", "1 Timóteushoz", 6),
    same("2Tim", "2 Timóteushoz", 4),
    same("Tit", "Tituszhoz", 3),
    same("Filem", "Filemonhoz", 1),
    same("Zsid", "Zsidókhoz", 13),
    same("Jak", "Jakab", 5),
    same("1Pt", "1 Péter", 5),
    same("2Pt", "2 Péter", 3),
    same("1Jn", "1 János", 5),
    same("2Jn", "2 János", 1),
    same("3Jn", "3 János", 1),
    same("Júd", "Júdás", 1),
    same("Jel", "Jelenések", 22),
];
