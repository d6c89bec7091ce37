//! Translation switches across the protestant/catholic canon boundary.

use shared::{
    catalog::Catalog,
    domain::{Book, Translation},
    error::BibleError,
};

/// Decides whether `current` can stay open when switching from `old` to `new`.
///
/// Within one canon the book is returned unchanged. Across canons the book is
/// remapped through the catalog's aligned abbreviation columns; the caller is
/// responsible for adopting the returned book.
pub fn reconcile(
    catalog: &Catalog,
    old: Translation,
    new: Translation,
    current: &Book,
) -> Result<Book, BibleError> {
    let (from, to) = (old.canon(), new.canon());
    if from == to {
        return Ok(current.clone());
    }

    let untranslatable = || BibleError::Translating(current.name.clone());

    let row = catalog
        .abbreviations_of(from)
        .iter()
        .position(|abbreviation| *abbreviation == current.abbreviation)
        .ok_or_else(untranslatable)?;
    let counterpart = catalog
        .abbreviations_of(to)
        .get(row)
        .ok_or_else(untranslatable)?;

    catalog
        .book_by_abbreviation(to, counterpart)
        .cloned()
        .ok_or_else(untranslatable)
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
