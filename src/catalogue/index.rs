use std::cmp::Ordering;
use tracing::warn;

use super::names::NameCatalogue;

fn is_terminator(c: u8) -> bool {
    c == b'"' || c == 0
}

/// Case-insensitive order of two catalogue names.
///
/// ASCII letters are folded to upper case, `"` and NUL end a name (as does
/// the end of the slice), and a name that ends first sorts lower.
pub fn compare_names(a: &[u8], b: &[u8]) -> Ordering {
    let mut i = 0;
    loop {
        let x = a.get(i).copied().unwrap_or(0).to_ascii_uppercase();
        let y = b.get(i).copied().unwrap_or(0).to_ascii_uppercase();

        match (is_terminator(x), is_terminator(y)) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        if x != y {
            return x.cmp(&y);
        }
        i += 1;
    }
}

/// Leading palettes kept in catalogue order: the first entry plus the run
/// of `*`-prefixed generated palettes right after it.
pub fn palette_skip(catalogue: &NameCatalogue) -> usize {
    let starred = catalogue
        .iter()
        .skip(1)
        .take_while(|name| name.starts_with('*'))
        .count();
    (1 + starred).min(catalogue.len())
}

/// Permutation of catalogue ids in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlphaIndex {
    order: Vec<usize>,
}

impl AlphaIndex {
    /// Sort the first `count` ids of `catalogue`, leaving `[0, skip)` in place.
    ///
    /// The sort is stable, so equal names keep catalogue order.
    pub fn rebuild(catalogue: &NameCatalogue, count: usize, skip: usize) -> Self {
        if count > catalogue.len() {
            warn!(
                "Catalogue has {} names but {} were requested",
                catalogue.len(),
                count
            );
        }
        let count = count.min(catalogue.len());
        let skip = skip.min(count);

        let mut order: Vec<usize> = (0..count).collect();
        order[skip..].sort_by(|&a, &b| compare_names(catalogue.name_bytes(a), catalogue.name_bytes(b)));

        Self { order }
    }

    /// Position of `id` in the sorted view
    pub fn locate(&self, id: usize) -> Option<usize> {
        self.order.iter().position(|&entry| entry == id)
    }

    /// The entry at `index` no longer maps to `id`
    pub fn is_stale(&self, index: usize, id: usize) -> bool {
        self.order.get(index) != Some(&id)
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.order.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    /// Names in sorted order
    pub fn sorted_names<'a>(&'a self, catalogue: &'a NameCatalogue) -> impl Iterator<Item = &'a str> + 'a {
        self.order
            .iter()
            .map(move |&id| catalogue.name(id).unwrap_or_default())
    }
}
