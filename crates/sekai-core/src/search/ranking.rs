//! Deterministic ordering of finished decks.

use super::CandidateDeck;
use std::cmp::Ordering;

/// Objective descending, then the ordered card-id sequence ascending.
pub fn compare_decks(a: &CandidateDeck, b: &CandidateDeck) -> Ordering {
    b.objective
        .total_cmp(&a.objective)
        .then_with(|| a.card_ids.cmp(&b.card_ids))
}

/// Stable sort under [`compare_decks`].
pub fn rank_decks(decks: &mut [CandidateDeck]) {
    decks.sort_by(compare_decks);
}

/// The `k` best decks seen so far, kept sorted best-first.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    decks: Vec<CandidateDeck>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            decks: Vec::with_capacity(capacity.saturating_add(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.decks.len() >= self.capacity
    }

    /// Objective a new deck has to reach to be kept. `None` until full.
    pub fn threshold(&self) -> Option<f64> {
        if self.is_full() {
            self.decks.last().map(|deck| deck.objective)
        } else {
            None
        }
    }

    /// Offers a deck. Returns whether it was kept. A deck with the same card sequence as one
    /// already held is ignored.
    pub fn offer(&mut self, deck: CandidateDeck) -> bool {
        if self.capacity == 0 || self.decks.iter().any(|held| held.card_ids == deck.card_ids) {
            return false;
        }
        if self.is_full() {
            match self.decks.last() {
                Some(worst) if compare_decks(&deck, worst) == Ordering::Less => {}
                _ => return false,
            }
        }
        let at = self
            .decks
            .partition_point(|held| compare_decks(held, &deck) == Ordering::Less);
        self.decks.insert(at, deck);
        self.decks.truncate(self.capacity);
        true
    }

    pub fn best(&self) -> Option<&CandidateDeck> {
        self.decks.first()
    }

    pub fn into_sorted_vec(self) -> Vec<CandidateDeck> {
        self.decks
    }
}
