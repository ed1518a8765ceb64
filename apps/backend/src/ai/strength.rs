//! Mapping from a target rating to an engine skill level.

use std::ops::Range;

use rand::Rng;

/// Approximate rating of each `Skill Level` (index = level).
pub const SKILL_TABLE: [u32; 21] = [
    800, 850, 900, 1000, 1100, 1200, 1300, 1400, 1500, 1600, 1700, 1800, 1900, 2000, 2100, 2200,
    2300, 2400, 2500, 2600, 3000,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strength {
    pub level: u8,
    /// Table rating of `level`, reported to players as the AI's rank.
    pub rank: u32,
}

impl Strength {
    pub fn for_level(level: u8) -> Self {
        let index = usize::from(level).min(SKILL_TABLE.len() - 1);
        Self {
            level: index as u8,
            rank: SKILL_TABLE[index],
        }
    }

    /// Draw a target rating uniformly from `ratings` and snap it to the table.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, ratings: Range<u32>) -> Self {
        let target = if ratings.is_empty() {
            ratings.start
        } else {
            rng.random_range(ratings)
        };
        Self::for_level(nearest_level(target))
    }
}

/// Level whose rating is closest to `target`; ties go to the lower level.
pub fn nearest_level(target: u32) -> u8 {
    let mut best = 0usize;
    let mut best_diff = u32::MAX;
    for (level, rating) in SKILL_TABLE.iter().enumerate() {
        let diff = rating.abs_diff(target);
        if diff < best_diff {
            best = level;
            best_diff = diff;
        }
    }
    best as u8
}
