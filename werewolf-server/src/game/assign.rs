use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use super::player::Player;
use super::role::{lookup, Role, FILLER};
use crate::error::EngineError;
use crate::types::PlayerId;

/// Role key → how many seats get it, e.g. `{"normalWolf": 2, "seer": 1}`.
pub type RoleCounts = BTreeMap<String, usize>;

/// Expand configured counts into one role per seat, in catalog order.
/// Short lists are padded with civilians and long ones truncated from the
/// end, unless `strict` is set.
pub fn build(counts: &RoleCounts, roster: usize, strict: bool) -> Result<Vec<Role>, EngineError> {
    let mut expanded = counts
        .iter()
        .map(|(key, n)| lookup(key).map(|d| (d.role, *n)))
        .collect::<Result<Vec<_>, _>>()?;
    expanded.sort_by_key(|(role, _)| *role);

    let mut roles: Vec<Role> = expanded
        .into_iter()
        .flat_map(|(role, n)| std::iter::repeat(role).take(n))
        .collect();

    if roles.len() != roster {
        if strict {
            return Err(EngineError::RoleCountMismatch {
                configured: roles.len(),
                roster,
            });
        }
        warn!(configured = roles.len(), roster, "role count mismatch, adjusting with filler");
        roles.resize(roster, FILLER);
    }
    Ok(roles)
}

/// Bind one role per player. Roles are shuffled, then the seat → role
/// pairing is shuffled again independently.
pub fn assign<R: Rng + ?Sized>(
    roster: &[(PlayerId, String)],
    mut roles: Vec<Role>,
    rng: &mut R,
) -> Result<Vec<Player>, EngineError> {
    if roles.len() != roster.len() {
        return Err(EngineError::RoleCountMismatch {
            configured: roles.len(),
            roster: roster.len(),
        });
    }

    roles.shuffle(rng);
    let mut pairing: Vec<usize> = (0..roster.len()).collect();
    pairing.shuffle(rng);

    Ok(roster
        .iter()
        .zip(pairing)
        .enumerate()
        .map(|(i, ((id, name), slot))| Player::new(id.clone(), name.clone(), i + 1, roles[slot]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn counts(pairs: &[(&str, usize)]) -> RoleCounts {
        pairs.iter().map(|(k, n)| (k.to_string(), *n)).collect()
    }

    #[test]
    fn pads_short_configuration_with_civilians() {
        let roles = build(&counts(&[("normalWolf", 1), ("seer", 1)]), 4, false).unwrap();
        assert_eq!(
            roles,
            vec![Role::NormalWolf, Role::Seer, Role::Civilian, Role::Civilian]
        );
    }

    #[test]
    fn truncates_long_configuration_from_the_end() {
        let roles = build(&counts(&[("normalWolf", 2), ("seer", 1), ("cupid", 1)]), 3, false).unwrap();
        assert_eq!(roles, vec![Role::NormalWolf, Role::NormalWolf, Role::Seer]);
    }

    #[test]
    fn strict_mode_rejects_mismatch() {
        let err = build(&counts(&[("normalWolf", 1)]), 4, true).unwrap_err();
        assert_eq!(
            err,
            EngineError::RoleCountMismatch {
                configured: 1,
                roster: 4
            }
        );
    }

    #[test]
    fn unknown_role_key_fails() {
        let err = build(&counts(&[("vampire", 1)]), 1, false).unwrap_err();
        assert_eq!(err, EngineError::UnknownRole("vampire".into()));
    }

    #[test]
    fn assign_keeps_seat_order_and_role_multiset() {
        let roster: Vec<(PlayerId, String)> =
            (1..=5).map(|i| (format!("p{i}"), format!("P{i}"))).collect();
        let roles = build(&counts(&[("normalWolf", 2), ("witch", 1)]), 5, false).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let players = assign(&roster, roles.clone(), &mut rng).unwrap();
        assert_eq!(players.len(), 5);
        for (i, p) in players.iter().enumerate() {
            assert_eq!(p.id, format!("p{}", i + 1));
            assert_eq!(p.seat, i + 1);
            assert!(p.is_alive && p.can_vote);
        }
        let mut got: Vec<Role> = players.iter().map(|p| p.role).collect();
        got.sort();
        assert_eq!(got, roles);
    }
}
