use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use werewolf_server::config::{GameConfig, TiePolicy};
use werewolf_server::game::assign::{assign, build, RoleCounts};
use werewolf_server::game::role::Role;
use werewolf_server::game::{Event, Game, NightAction};
use werewolf_server::types::{Phase, PlayerId};

const KEYS: [&str; 8] = [
    "normalWolf",
    "whiteWolf",
    "seer",
    "witch",
    "hunter",
    "guard",
    "idiot",
    "cupid",
];

fn counts_strategy() -> impl Strategy<Value = RoleCounts> {
    prop::collection::btree_map(
        prop::sample::select(KEYS.to_vec()).prop_map(|s| s.to_string()),
        1usize..4,
        0..6,
    )
}

fn roster(n: usize) -> Vec<(PlayerId, String)> {
    (1..=n).map(|i| (format!("p{i}"), format!("P{i}"))).collect()
}

proptest! {
    #[test]
    fn every_player_gets_exactly_one_role(
        counts in counts_strategy(),
        players in 4usize..=12,
        seed in any::<u64>(),
    ) {
        let roles = build(&counts, players, false).unwrap();
        prop_assert_eq!(roles.len(), players);

        let mut rng = StdRng::seed_from_u64(seed);
        let dealt = assign(&roster(players), roles.clone(), &mut rng).unwrap();

        let mut ids: Vec<_> = dealt.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), players);

        let mut expected = roles;
        let mut got: Vec<Role> = dealt.iter().map(|p| p.role).collect();
        expected.sort();
        got.sort();
        prop_assert_eq!(got, expected);

        for (i, p) in dealt.iter().enumerate() {
            prop_assert_eq!(p.seat, i + 1);
            prop_assert!(p.is_alive);
            prop_assert_eq!(p.faction, p.role.faction());
        }
    }

    #[test]
    fn strict_mode_only_accepts_exact_counts(
        counts in counts_strategy(),
        players in 4usize..=12,
    ) {
        let configured: usize = counts.values().sum();
        let result = build(&counts, players, true);
        prop_assert_eq!(result.is_ok(), configured == players);
    }

    #[test]
    fn padding_uses_civilians_and_truncation_keeps_catalog_order(
        counts in counts_strategy(),
        players in 4usize..=12,
    ) {
        let roles = build(&counts, players, false).unwrap();
        let configured: usize = counts.values().sum();
        if configured < players {
            prop_assert!(roles[configured..].iter().all(|r| *r == Role::Civilian));
        }
        let listed = &roles[..configured.min(players)];
        prop_assert!(listed.windows(2).all(|w| w[0] <= w[1]));
    }
}

/// Two nights of guarding under a wolf that always attacks the guarded
/// player on night two. Everyone votes round-robin so day one is a tie.
fn guarded_twice(first: usize, second: usize, seed: u64) -> bool {
    let config = GameConfig {
        first_night_kill: false,
        tie_policy: TiePolicy::NoElimination,
        ..GameConfig::default()
    };
    let mut g = Game::new("prop".into(), config);
    let counts: RoleCounts = [("normalWolf".to_string(), 1), ("guard".to_string(), 1)].into();
    let mut rng = StdRng::seed_from_u64(seed);
    g.assign_roles(&roster(8), &counts, &mut rng).unwrap();

    let wolf = g.players().iter().find(|p| p.role == Role::NormalWolf).unwrap().id.clone();
    let guard = g.players().iter().find(|p| p.role == Role::Guard).unwrap().id.clone();
    let shielded: Vec<PlayerId> = g
        .players()
        .iter()
        .filter(|p| p.role != Role::NormalWolf)
        .map(|p| p.id.clone())
        .collect();
    let (t1, t2) = (shielded[first].clone(), shielded[second].clone());

    let ev = g.submit_night_action(&guard, NightAction::Guard { target: t1 }).unwrap();
    let token = ev
        .iter()
        .rev()
        .find_map(|e| match e {
            Event::ArmTimer { token, .. } => Some(*token),
            _ => None,
        })
        .unwrap();
    g.timer_fired(token);
    assert_eq!(g.phase(), Phase::DayVote);

    let ids: Vec<PlayerId> = g.players().iter().map(|p| p.id.clone()).collect();
    for (i, voter) in ids.iter().enumerate() {
        g.submit_vote(voter, &ids[(i + 1) % ids.len()]).unwrap();
    }
    assert_eq!(g.day(), 2);

    g.submit_night_action(&guard, NightAction::Guard { target: t2.clone() }).unwrap();
    g.submit_night_action(&wolf, NightAction::Kill { target: t2.clone() }).unwrap();
    g.is_alive(&t2)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn guard_never_shields_the_same_player_two_nights_running(
        first in 0usize..7,
        second in 0usize..7,
        seed in any::<u64>(),
    ) {
        prop_assert_eq!(guarded_twice(first, second, seed), first != second);
    }
}
