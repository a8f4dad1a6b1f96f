use rand::seq::SliceRandom;
use std::collections::HashSet;

/// The seven physical keys a challenge may draw from.
pub const KEY_POOL: [char; 7] = ['A', 'S', 'D', 'F', 'J', 'K', 'L'];

/// Result of feeding one key-down to the active challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Key already held, or otherwise not a new press.
    Ignored,
    /// A target key went down but the chord is not complete yet.
    Progress,
    /// Every target key is now held.
    Success,
    /// A non-target key went down. Any key outside the target set fails the
    /// attempt immediately, even one that belongs to the pool.
    Failure,
}

/// A timed request for the player to hold a specific set of keys together.
/// Holds only the key state; the countdown lives with the session counters.
#[derive(Debug, Clone)]
pub struct Challenge {
    target: Vec<char>,
    pressed: HashSet<char>,
}

impl Challenge {
    /// Draw `n` distinct keys from the pool via an unbiased partial shuffle.
    pub fn generate(n: usize) -> Self {
        let mut rng = rand::thread_rng();
        let target = KEY_POOL
            .choose_multiple(&mut rng, n.min(KEY_POOL.len()))
            .copied()
            .collect();
        Self {
            target,
            pressed: HashSet::new(),
        }
    }

    /// Build a challenge with a known target set.
    pub fn with_target(keys: &[char]) -> Self {
        Self {
            target: keys.iter().map(|k| k.to_ascii_uppercase()).collect(),
            pressed: HashSet::new(),
        }
    }

    pub fn target_keys(&self) -> &[char] {
        &self.target
    }

    /// Currently held target keys, sorted for stable display.
    pub fn pressed_keys(&self) -> Vec<char> {
        let mut keys: Vec<char> = self.pressed.iter().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn key_down(&mut self, key: char) -> KeyOutcome {
        let key = key.to_ascii_uppercase();
        // Held keys produce no new presses; this also absorbs key-repeat the
        // terminal did not flag as such.
        if self.pressed.contains(&key) {
            return KeyOutcome::Ignored;
        }
        if !self.target.contains(&key) {
            return KeyOutcome::Failure;
        }
        self.pressed.insert(key);
        if self.target.iter().all(|k| self.pressed.contains(k)) {
            self.pressed.clear();
            KeyOutcome::Success
        } else {
            KeyOutcome::Progress
        }
    }

    /// Releasing early neither fails the attempt nor counts toward the next
    /// success check.
    pub fn key_up(&mut self, key: char) {
        self.pressed.remove(&key.to_ascii_uppercase());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_draws_distinct_pool_keys() {
        for n in 1..=KEY_POOL.len() {
            let challenge = Challenge::generate(n);
            assert_eq!(challenge.target_keys().len(), n);
            let unique: HashSet<char> = challenge.target_keys().iter().copied().collect();
            assert_eq!(unique.len(), n, "target keys must be distinct");
            assert!(challenge.target_keys().iter().all(|k| KEY_POOL.contains(k)));
        }
    }

    #[test]
    fn test_generate_oversized_request_clamps_to_pool() {
        let challenge = Challenge::generate(20);
        assert_eq!(challenge.target_keys().len(), KEY_POOL.len());
    }

    #[test]
    fn test_single_key_success() {
        let mut challenge = Challenge::with_target(&['A']);
        assert_eq!(challenge.key_down('A'), KeyOutcome::Success);
        assert!(challenge.pressed_keys().is_empty(), "pressed clears on success");
    }

    #[test]
    fn test_chord_requires_all_keys_any_order() {
        let mut challenge = Challenge::with_target(&['A', 'S', 'D']);
        assert_eq!(challenge.key_down('D'), KeyOutcome::Progress);
        assert_eq!(challenge.key_down('A'), KeyOutcome::Progress);
        assert_eq!(challenge.key_down('S'), KeyOutcome::Success);
    }

    #[test]
    fn test_pool_key_outside_target_fails() {
        let mut challenge = Challenge::with_target(&['S']);
        // 'K' is in the pool but not in the target: still an immediate failure.
        assert_eq!(challenge.key_down('K'), KeyOutcome::Failure);
    }

    #[test]
    fn test_non_pool_key_fails() {
        let mut challenge = Challenge::with_target(&['S']);
        assert_eq!(challenge.key_down('Q'), KeyOutcome::Failure);
    }

    #[test]
    fn test_held_key_is_ignored() {
        let mut challenge = Challenge::with_target(&['A', 'S']);
        assert_eq!(challenge.key_down('A'), KeyOutcome::Progress);
        assert_eq!(challenge.key_down('A'), KeyOutcome::Ignored);
        assert_eq!(challenge.key_down('a'), KeyOutcome::Ignored);
    }

    #[test]
    fn test_release_removes_from_pressed_without_failing() {
        let mut challenge = Challenge::with_target(&['A', 'S', 'D']);
        challenge.key_down('A');
        challenge.key_down('S');
        challenge.key_up('A');
        assert_eq!(challenge.pressed_keys(), vec!['S']);
        // The released key no longer counts toward completion.
        assert_eq!(challenge.key_down('D'), KeyOutcome::Progress);
        assert_eq!(challenge.key_down('A'), KeyOutcome::Success);
    }

    #[test]
    fn test_lowercase_input_is_normalized() {
        let mut challenge = Challenge::with_target(&['J', 'K']);
        assert_eq!(challenge.key_down('j'), KeyOutcome::Progress);
        assert_eq!(challenge.key_down('k'), KeyOutcome::Success);
    }
}
