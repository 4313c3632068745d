//! Ordered set of small signed integers.

/// A set of signed integers kept in ascending order.
///
/// Used to de-duplicate by-part lists and to collect resolved positions.
/// Iteration and [`IntSet::to_vec`] yield negatives first, then
/// non-negatives, each in natural order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntSet {
    values: Vec<i32>,
}

impl IntSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Inserts a value, returning `false` if it was already present.
    pub fn add(&mut self, value: i32) -> bool {
        match self.values.binary_search(&value) {
            Ok(_) => false,
            Err(index) => {
                self.values.insert(index, value);
                true
            }
        }
    }

    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<i32> {
        self.values.clone()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<i32> {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.iter().copied()
    }
}

impl FromIterator<i32> for IntSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut values: Vec<i32> = iter.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Self { values }
    }
}

impl Extend<i32> for IntSet {
    fn extend<I: IntoIterator<Item = i32>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

/// Returns the distinct values of `values` in ascending order.
#[must_use]
pub fn uniquify(values: &[i32]) -> Vec<i32> {
    values.iter().copied().collect::<IntSet>().into_vec()
}
