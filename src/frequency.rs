use rustc_hash::FxHashMap;

/// Word → count across a whole run. Only ever grows; no eviction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: FxHashMap<String, u64>,
    total: u64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, word: &str) {
        debug_assert!(!word.is_empty(), "empty token reached the frequency table");
        match self.counts.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(word.to_string(), 1);
            }
        }
        self.total += 1;
    }

    pub fn accumulate<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.add(word.as_ref());
        }
    }

    /// Folds another table into this one. Order of merging never changes the result.
    pub fn merge(&mut self, other: FrequencyTable) {
        if self.counts.is_empty() {
            *self = other;
            return;
        }
        self.counts.reserve(other.counts.len());
        for (word, count) in other.counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
        self.total += other.total;
    }

    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(word, count)| (word.as_str(), *count))
    }

    pub(crate) fn into_counts(self) -> FxHashMap<String, u64> {
        self.counts
    }
}
