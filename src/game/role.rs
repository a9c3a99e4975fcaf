use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::SetupError;
use crate::types::{Abilities, Player, Role, MAX_PLAYERS, MIN_PLAYERS};
use crate::utils::shuffle_array;

/// Requested number of seats per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDistribution(BTreeMap<Role, usize>);

impl Default for RoleDistribution {
    /// The eight-seat table: two wolves, one of each special, two villagers.
    fn default() -> Self {
        Self::empty()
            .with(Role::Werewolf, 2)
            .with(Role::Seer, 1)
            .with(Role::Witch, 1)
            .with(Role::Hunter, 1)
            .with(Role::Guard, 1)
            .with(Role::Villager, 2)
    }
}

impl RoleDistribution {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, role: Role, count: usize) -> Self {
        self.0.insert(role, count);
        self
    }

    pub fn count(&self, role: Role) -> usize {
        self.0.get(&role).copied().unwrap_or(0)
    }

    /// Saturates instead of overflowing; [`check_counts`] keeps real tables
    /// far below that.
    ///
    /// [`check_counts`]: RoleDistribution::check_counts
    pub fn total(&self) -> usize {
        self.0
            .values()
            .fold(0usize, |sum, count| sum.saturating_add(*count))
    }

    /// Seats taken by everything except villagers.
    pub fn special_roles(&self) -> usize {
        self.total().saturating_sub(self.count(Role::Villager))
    }

    /// Rejects any role asking for more seats than a table can have.
    pub fn check_counts(&self) -> Result<(), SetupError> {
        match self.0.iter().find(|(_, count)| **count > MAX_PLAYERS) {
            Some((role, count)) => Err(SetupError::RoleCountTooLarge {
                role: *role,
                count: *count,
            }),
            None => Ok(()),
        }
    }

    /// Parses a client-supplied `{"Seer": 1, ...}` map.
    pub fn from_named(named: &BTreeMap<String, usize>) -> Result<Self, SetupError> {
        let dist = named.iter().try_fold(Self::empty(), |dist, (name, count)| {
            let role: Role = name.parse().map_err(SetupError::UnknownRole)?;
            let already = dist.count(role);
            let merged = already
                .checked_add(*count)
                .filter(|merged| *merged <= MAX_PLAYERS)
                .ok_or(SetupError::RoleCountTooLarge {
                    role,
                    count: already.saturating_add(*count),
                })?;
            Ok(dist.with(role, merged))
        })?;
        dist.check_counts()?;
        Ok(dist)
    }

    /// The default table shrunk to fit `player_count` seats. Specials are
    /// dropped Guard first, then Hunter, Witch and Seer, keeping at least one
    /// villager seat.
    pub fn recommended(player_count: usize) -> Self {
        let mut dist = Self::default();
        if player_count <= 4 {
            dist = dist.with(Role::Werewolf, 1);
        }
        for role in [Role::Guard, Role::Hunter, Role::Witch, Role::Seer] {
            if dist.special_roles() < player_count {
                break;
            }
            dist = dist.with(role, 0);
        }
        while dist.special_roles() >= player_count && dist.count(Role::Werewolf) > 1 {
            let wolves = dist.count(Role::Werewolf);
            dist = dist.with(Role::Werewolf, wolves - 1);
        }
        dist
    }

    fn pool(&self) -> Vec<Role> {
        self.0
            .iter()
            .flat_map(|(role, count)| std::iter::repeat(*role).take(*count))
            .collect()
    }
}

pub fn check_player_count(player_count: usize) -> Result<(), SetupError> {
    if player_count < MIN_PLAYERS {
        return Err(SetupError::TooFewPlayers {
            found: player_count,
        });
    }
    if player_count > MAX_PLAYERS {
        return Err(SetupError::TooManyPlayers {
            found: player_count,
        });
    }
    Ok(())
}

/// Validates `requested` against the seat count and resolves the final
/// distribution. Small tables keep a single werewolf; villagers absorb any
/// difference.
pub fn adjust_distribution(
    player_count: usize,
    requested: &RoleDistribution,
) -> Result<RoleDistribution, SetupError> {
    check_player_count(player_count)?;
    requested.check_counts()?;

    let mut dist = requested.clone();
    let wolves = dist.count(Role::Werewolf);
    if wolves == 0 {
        return Err(SetupError::NoWerewolves);
    }

    if player_count <= 4 && wolves > 1 {
        debug!(wolves, "small table, reducing werewolves to one");
        let villagers = dist.count(Role::Villager);
        dist = dist
            .with(Role::Werewolf, 1)
            .with(Role::Villager, villagers + wolves - 1);
    }

    let special_roles = dist.special_roles();
    if special_roles > player_count {
        return Err(SetupError::NegativeVillagers {
            player_count,
            special_roles,
        });
    }

    Ok(dist.with(Role::Villager, player_count - special_roles))
}

/// Deals one role per player from a shuffled pool and initialises abilities.
pub fn assign_roles<R: Rng + ?Sized>(
    players: &mut [Player],
    requested: &RoleDistribution,
    rng: &mut R,
) -> Result<RoleDistribution, SetupError> {
    let dist = adjust_distribution(players.len(), requested)?;
    let mut pool = shuffle_array(&dist.pool(), rng);

    for player in players.iter_mut() {
        // The pool is exactly as long as the table after adjustment.
        let role = pool.pop().unwrap_or(Role::Villager);
        player.role = Some(role);
        player.abilities = Abilities::for_role(role);
    }

    Ok(dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::create_player;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(n: u32) -> Vec<Player> {
        (1..=n)
            .map(|id| create_player(id, format!("P{id}"), id == 1))
            .collect()
    }

    fn count_roles(players: &[Player], role: Role) -> usize {
        players.iter().filter(|p| p.has_role(role)).count()
    }

    #[test]
    fn default_table_deals_every_role() {
        let mut players = table(8);
        let mut rng = StdRng::seed_from_u64(3);
        assign_roles(&mut players, &RoleDistribution::default(), &mut rng).unwrap();

        assert!(players.iter().all(|p| p.role.is_some()));
        assert_eq!(count_roles(&players, Role::Werewolf), 2);
        assert_eq!(count_roles(&players, Role::Villager), 2);
        for role in [Role::Seer, Role::Witch, Role::Hunter, Role::Guard] {
            assert_eq!(count_roles(&players, role), 1, "{role}");
        }
    }

    #[test]
    fn abilities_follow_roles() {
        let mut players = table(8);
        let mut rng = StdRng::seed_from_u64(17);
        assign_roles(&mut players, &RoleDistribution::default(), &mut rng).unwrap();

        for player in &players {
            assert_eq!(
                player.abilities,
                Abilities::for_role(player.role.unwrap()),
                "{}",
                player.label()
            );
        }
    }

    #[test]
    fn role_count_matches_player_count_for_every_size() {
        for n in MIN_PLAYERS..=MAX_PLAYERS {
            let mut players = table(n as u32);
            let mut rng = StdRng::seed_from_u64(n as u64);
            let dist = RoleDistribution::recommended(n);
            let resolved = assign_roles(&mut players, &dist, &mut rng).unwrap();

            assert_eq!(resolved.total(), n);
            assert!(count_roles(&players, Role::Werewolf) >= 1);
            assert!(players.iter().all(|p| p.role.is_some()));
        }
    }

    #[test]
    fn small_tables_keep_a_single_werewolf() {
        let requested = RoleDistribution::empty()
            .with(Role::Werewolf, 3)
            .with(Role::Seer, 1);
        let dist = adjust_distribution(4, &requested).unwrap();
        assert_eq!(dist.count(Role::Werewolf), 1);
        assert_eq!(dist.count(Role::Seer), 1);
        assert_eq!(dist.count(Role::Villager), 2);
    }

    #[test]
    fn villagers_pad_and_trim_to_fit() {
        let requested = RoleDistribution::empty()
            .with(Role::Werewolf, 2)
            .with(Role::Villager, 10);
        let dist = adjust_distribution(6, &requested).unwrap();
        assert_eq!(dist.count(Role::Villager), 4);
        assert_eq!(dist.total(), 6);
    }

    #[test]
    fn overfull_distribution_is_rejected() {
        let err = adjust_distribution(5, &RoleDistribution::default()).unwrap_err();
        assert_eq!(
            err,
            SetupError::NegativeVillagers {
                player_count: 5,
                special_roles: 6,
            }
        );
    }

    #[test]
    fn distribution_without_wolves_is_rejected() {
        let requested = RoleDistribution::empty().with(Role::Seer, 1);
        assert_eq!(
            adjust_distribution(6, &requested),
            Err(SetupError::NoWerewolves)
        );
    }

    #[test]
    fn player_count_bounds_are_enforced() {
        let dist = RoleDistribution::default();
        assert_eq!(
            adjust_distribution(2, &dist),
            Err(SetupError::TooFewPlayers { found: 2 })
        );
        assert_eq!(
            adjust_distribution(21, &dist),
            Err(SetupError::TooManyPlayers { found: 21 })
        );
    }

    #[test]
    fn named_distribution_parses_roles() {
        let mut named = BTreeMap::new();
        named.insert("werewolf".to_string(), 1);
        named.insert("Seer".to_string(), 1);
        let dist = RoleDistribution::from_named(&named).unwrap();
        assert_eq!(dist.count(Role::Werewolf), 1);
        assert_eq!(dist.count(Role::Seer), 1);

        named.insert("mayor".to_string(), 1);
        assert_eq!(
            RoleDistribution::from_named(&named),
            Err(SetupError::UnknownRole("mayor".to_string()))
        );
    }

    #[test]
    fn huge_role_counts_are_rejected_without_overflow() {
        let requested = RoleDistribution::empty()
            .with(Role::Werewolf, usize::MAX)
            .with(Role::Seer, 1);
        assert_eq!(
            adjust_distribution(6, &requested),
            Err(SetupError::RoleCountTooLarge {
                role: Role::Werewolf,
                count: usize::MAX,
            })
        );
        assert_eq!(requested.total(), usize::MAX);

        let mut named = BTreeMap::new();
        named.insert("werewolf".to_string(), usize::MAX);
        named.insert("seer".to_string(), 1);
        assert!(matches!(
            RoleDistribution::from_named(&named),
            Err(SetupError::RoleCountTooLarge {
                role: Role::Werewolf,
                ..
            })
        ));
    }

    #[test]
    fn aliases_are_merged_before_the_bound_is_checked() {
        let mut named = BTreeMap::new();
        named.insert("wolf".to_string(), MAX_PLAYERS);
        named.insert("werewolf".to_string(), 1);
        assert_eq!(
            RoleDistribution::from_named(&named),
            Err(SetupError::RoleCountTooLarge {
                role: Role::Werewolf,
                count: MAX_PLAYERS + 1,
            })
        );
    }

    #[test]
    fn recommended_small_table_keeps_a_villager() {
        let dist = RoleDistribution::recommended(3);
        assert_eq!(dist.count(Role::Werewolf), 1);
        assert!(dist.special_roles() < 3);
        assert_eq!(RoleDistribution::recommended(8), RoleDistribution::default());
    }
}
