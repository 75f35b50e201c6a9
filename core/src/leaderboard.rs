//! Time-ranked list of players still on course, plus the per-country tally
//! of those who have finished.
//!
//! Records are kept slowest-first so the fastest remaining player sits at
//! the tail and finishing is a `pop`.

use crate::store::{PlayerId, TrajectoryStore};
use ghostreel_shared::CountryCode;
use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishRecord {
    pub player: PlayerId,
    pub time_ms: u64,
}

/// Finish counts per country, remembering first-seen order for ties.
#[derive(Debug, Clone, Default)]
pub struct CountryTally {
    counts: Vec<(CountryCode, u32)>,
    index: HashMap<CountryCode, usize>,
}

impl CountryTally {
    pub fn increment(&mut self, country: CountryCode) {
        match self.index.get(&country) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(country, self.counts.len());
                self.counts.push((country, 1));
            }
        }
    }

    pub fn get(&self, country: CountryCode) -> u32 {
        self.index.get(&country).map_or(0, |&i| self.counts[i].1)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().map(|&(_, n)| n).max().unwrap_or(0)
    }

    /// Countries by descending count; equal counts keep first-seen order.
    pub fn sorted(&self) -> Vec<(CountryCode, u32)> {
        let mut sorted = self.counts.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

#[derive(Debug, Clone)]
pub struct LeaderboardTracker {
    records: Vec<FinishRecord>,
    /// Field size when the board was sorted; ranks stay fixed after pops.
    ranked: usize,
    /// Country per player id.
    countries: Vec<Option<CountryCode>>,
    tally: CountryTally,
}

impl LeaderboardTracker {
    /// Build an unsorted tracker. `countries` is indexed by player id.
    pub fn new(records: Vec<FinishRecord>, countries: Vec<Option<CountryCode>>) -> Self {
        Self {
            ranked: records.len(),
            records,
            countries,
            tally: CountryTally::default(),
        }
    }

    /// Sorted tracker over every player in the store.
    pub fn from_store(store: &TrajectoryStore) -> Self {
        let countries = store.players().iter().map(|p| p.country).collect();
        let mut tracker = Self::new(store.finish_records(), countries);
        tracker.sort();
        tracker
    }

    /// Slowest first. The sort is stable, so equal times keep insertion order.
    pub fn sort(&mut self) {
        self.records.sort_by(|a, b| b.time_ms.cmp(&a.time_ms));
        self.ranked = self.records.len();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FinishRecord] {
        &self.records
    }

    /// Overall rank of the record at `index` among every player sorted.
    ///
    /// Before any pop the tail is rank 1. Finished players keep their
    /// ranks, so the remaining ones do not move up.
    pub fn rank_of(&self, index: usize) -> usize {
        self.ranked - index
    }

    /// Remove the fastest remaining player and count their country.
    ///
    /// # Panics
    ///
    /// Panics if the tracker is empty. Callers pop once per finished
    /// trajectory, so an empty pop means the session lost count.
    pub fn pop_finished(&mut self) -> FinishRecord {
        let record = self
            .records
            .pop()
            .expect("pop_finished called on an empty leaderboard");
        if let Some(country) = self.countries.get(record.player).copied().flatten() {
            self.tally.increment(country);
        }
        record
    }

    /// Up to `k` `(rank, player)` pairs, fastest first.
    ///
    /// The slowest remaining player (index 0) is never listed.
    pub fn visible(&self, k: usize) -> Vec<(usize, PlayerId)> {
        (1..self.records.len())
            .rev()
            .take(k)
            .map(|index| (self.rank_of(index), self.records[index].player))
            .collect()
    }

    pub fn tally(&self) -> &CountryTally {
        &self.tally
    }

    pub fn tally_sorted(&self) -> Vec<(CountryCode, u32)> {
        self.tally.sorted()
    }
}
