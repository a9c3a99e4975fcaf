//! Player creation and NPC naming.

use std::collections::HashSet;

use rand::Rng;

use crate::types::{Abilities, Player, PlayerId};
use crate::utils::pick_random;

const NAME_POOL: [&str; 20] = [
    "Ming", "Hua", "Jing", "Ling", "Gang", "Ade", "Qiang", "Mei", "Zhen", "Le", "Yu", "Han",
    "Hao", "Shi", "Ting", "Jie", "Ying", "Jun", "Yi", "Zhi",
];

pub fn create_player(id: PlayerId, name: impl Into<String>, is_human: bool) -> Player {
    Player {
        id,
        name: name.into(),
        is_human,
        is_alive: true,
        role: None,
        abilities: Abilities::None,
    }
}

/// Picks an unused name from the pool. Once the pool is exhausted a numeric
/// suffix is appended until the result is unused.
pub fn generate_player_name<R: Rng + ?Sized>(used: &HashSet<String>, rng: &mut R) -> String {
    let available: Vec<&str> = NAME_POOL
        .iter()
        .copied()
        .filter(|name| !used.contains(*name))
        .collect();

    if let Some(name) = pick_random(&available, rng) {
        return name.to_string();
    }

    loop {
        let base = pick_random(&NAME_POOL, rng).unwrap_or("Player");
        let candidate = format!("{base}{}", rng.random_range(1..=100));
        if !used.contains(&candidate) {
            return candidate;
        }
    }
}
