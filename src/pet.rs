use serde::{Deserialize, Serialize};

pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;

/// The pet's three vital stats, each kept inside `[0, 100]`.
///
/// Fields are private so every path in goes through clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PetStatus {
    happiness: i32,
    health: i32,
    hunger: i32,
}

impl Default for PetStatus {
    fn default() -> Self {
        Self::full()
    }
}

impl PetStatus {
    pub fn new(happiness: i32, health: i32, hunger: i32) -> Self {
        Self {
            happiness: clamp_stat(happiness),
            health: clamp_stat(health),
            hunger: clamp_stat(hunger),
        }
    }

    pub fn full() -> Self {
        Self::new(STAT_MAX, STAT_MAX, STAT_MAX)
    }

    pub fn happiness(&self) -> i32 {
        self.happiness
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn hunger(&self) -> i32 {
        self.hunger
    }

    /// Add signed deltas and clamp each field. Always succeeds.
    pub fn apply_delta(&mut self, happiness: i32, health: i32, hunger: i32) {
        self.happiness = clamp_stat(self.happiness.saturating_add(happiness));
        self.health = clamp_stat(self.health.saturating_add(health));
        self.hunger = clamp_stat(self.hunger.saturating_add(hunger));
    }

    pub fn apply_effect(&mut self, effect: StatEffect) {
        match effect {
            StatEffect::Happiness(delta) => self.apply_delta(delta, 0, 0),
            StatEffect::Health(delta) => self.apply_delta(0, delta, 0),
            StatEffect::Hunger(delta) => self.apply_delta(0, 0, delta),
            StatEffect::None => {}
        }
    }

    /// Any stat bottomed out.
    pub fn is_depleted(&self) -> bool {
        self.happiness == STAT_MIN || self.health == STAT_MIN || self.hunger == STAT_MIN
    }

    /// Stats at or below `threshold`, by name.
    pub fn low_stats(&self, threshold: i32) -> Vec<(&'static str, i32)> {
        [
            ("happiness", self.happiness),
            ("health", self.health),
            ("hunger", self.hunger),
        ]
        .into_iter()
        .filter(|(_, value)| *value <= threshold)
        .collect()
    }
}

fn clamp_stat(value: i32) -> i32 {
    value.clamp(STAT_MIN, STAT_MAX)
}

/// Direct stat change caused by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatEffect {
    Happiness(i32),
    Health(i32),
    Hunger(i32),
    None,
}

/// Species unlock in a strict chain: Blob, Fish, Gecko, Cat, Dog, Unicorn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    Blob,
    Fish,
    Gecko,
    Cat,
    Dog,
    Unicorn,
}

impl Species {
    pub const CHAIN: [Species; 6] = [
        Species::Blob,
        Species::Fish,
        Species::Gecko,
        Species::Cat,
        Species::Dog,
        Species::Unicorn,
    ];

    /// The species that must be current before this one can be bought.
    pub fn predecessor(self) -> Option<Species> {
        let idx = Self::CHAIN.iter().position(|s| *s == self)?;
        idx.checked_sub(1).map(|prev| Self::CHAIN[prev])
    }

    pub fn successor(self) -> Option<Species> {
        let idx = Self::CHAIN.iter().position(|s| *s == self)?;
        Self::CHAIN.get(idx + 1).copied()
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Species::Blob => write!(f, "blob"),
            Species::Fish => write!(f, "fish"),
            Species::Gecko => write!(f, "gecko"),
            Species::Cat => write!(f, "cat"),
            Species::Dog => write!(f, "dog"),
            Species::Unicorn => write!(f, "unicorn"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pet {
    pub species: Species,
    pub status: PetStatus,
}

impl Default for Pet {
    fn default() -> Self {
        Self {
            species: Species::Blob,
            status: PetStatus::full(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_out_of_range() {
        let status = PetStatus::new(-5, 250, 50);
        assert_eq!(status.happiness(), 0);
        assert_eq!(status.health(), 100);
        assert_eq!(status.hunger(), 50);
    }

    #[test]
    fn test_large_delta_saturates_at_max() {
        let mut status = PetStatus::new(10, 20, 30);
        status.apply_delta(1000, 1000, 1000);
        assert_eq!(status, PetStatus::full());
    }

    #[test]
    fn test_delta_sequences_stay_in_range() {
        let mut status = PetStatus::new(50, 50, 50);
        let deltas = [(-70, 30, 5), (200, -200, -60), (i32::MIN, i32::MAX, 3), (15, 15, -1)];
        for (a, b, c) in deltas {
            status.apply_delta(a, b, c);
            for value in [status.happiness(), status.health(), status.hunger()] {
                assert!((STAT_MIN..=STAT_MAX).contains(&value));
            }
        }
    }

    #[test]
    fn test_apply_effect_touches_one_stat() {
        let mut status = PetStatus::new(40, 40, 40);
        status.apply_effect(StatEffect::Hunger(25));
        assert_eq!((status.happiness(), status.health(), status.hunger()), (40, 40, 65));
        status.apply_effect(StatEffect::None);
        assert_eq!(status.hunger(), 65);
    }

    #[test]
    fn test_species_chain() {
        assert_eq!(Species::Blob.predecessor(), None);
        assert_eq!(Species::Gecko.predecessor(), Some(Species::Fish));
        assert_eq!(Species::Dog.successor(), Some(Species::Unicorn));
        assert_eq!(Species::Unicorn.successor(), None);
    }

    #[test]
    fn test_depleted_and_low_stats() {
        let status = PetStatus::new(0, 15, 80);
        assert!(status.is_depleted());
        let low: Vec<_> = status.low_stats(20).into_iter().map(|(name, _)| name).collect();
        assert_eq!(low, vec!["happiness", "health"]);
    }
}
