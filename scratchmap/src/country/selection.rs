//! Ordered set of selected countries.

use super::CountryId;

/// Countries picked for one generation, in the order they were first named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountrySelection {
    ids: Vec<CountryId>,
}

impl CountrySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a country. Returns `false` if it was already selected.
    pub fn insert(&mut self, id: CountryId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: CountryId) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = CountryId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<CountryId> for CountrySelection {
    fn from_iter<T: IntoIterator<Item = CountryId>>(iter: T) -> Self {
        let mut selection = Self::new();
        for id in iter {
            selection.insert(id);
        }
        selection
    }
}
