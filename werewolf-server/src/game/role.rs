use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::PlayerId;

/// Every role the catalog knows. Declaration order is catalog order, which is
/// also the order roles are listed in when a configuration is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    NormalWolf,
    WhiteWolf,
    WerewolfKing,
    BloodMoonApostle,
    Seer,
    Witch,
    Hunter,
    Guard,
    Silencer,
    Knight,
    Civilian,
    OldRogue,
    Bomber,
    Idiot,
    Cupid,
    WildChild,
}

/// Pads short configurations.
pub const FILLER: Role = Role::Civilian;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Faction {
    Werewolf,
    Good,
    Civilian,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ability {
    /// Casts a ballot in the nightly werewolf kill.
    WolfKill,
    /// Sits out the kill ballot on night 1.
    ObservesFirstNight,
    /// May blow themselves up at night.
    SelfDetonate,
    /// Self-detonation drags one nominated player along.
    DetonationTakesTarget,
    /// Self-detonation voids the good side's night actions.
    DetonationVoidsGood,
    /// Takes one player along when voted out.
    RevengeOnVote,
    Inspect,
    Potions,
    /// Shoots one player when voted out. Blocked by general immunity.
    ShootOnVote,
    Guard,
    Silence,
    Duel,
    /// Survives poison, silence and shots.
    GeneralImmunity,
    /// Everyone who voted this player out dies with them.
    BlastVoters,
    /// Reads as hostile to an inspector whatever the faction bookkeeping says.
    InspectsHostile,
    /// A vote-out costs voting rights instead of life.
    SurvivesVote,
    PairLovers,
    ChooseMentor,
}

#[derive(Debug)]
pub struct RoleDescriptor {
    pub role: Role,
    pub key: &'static str,
    pub faction: Faction,
    pub abilities: &'static [Ability],
    pub night_eligible: bool,
    pub antidotes: u8,
    pub poisons: u8,
    pub text: &'static str,
}

use Ability::*;

static CATALOG: [RoleDescriptor; 16] = [
    RoleDescriptor {
        role: Role::NormalWolf,
        key: "normalWolf",
        faction: Faction::Werewolf,
        abilities: &[WolfKill],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "Each night, agree with the pack on a player to kill.",
    },
    RoleDescriptor {
        role: Role::WhiteWolf,
        key: "whiteWolf",
        faction: Faction::Werewolf,
        abilities: &[WolfKill, SelfDetonate, DetonationTakesTarget, RevengeOnVote],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "Hunt with the pack. Once per game you may self-detonate at night and take one player with you.",
    },
    RoleDescriptor {
        role: Role::WerewolfKing,
        key: "werewolfKing",
        faction: Faction::Werewolf,
        abilities: &[WolfKill, RevengeOnVote],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "Hunt with the pack. If voted out, the player you voted for dies with you.",
    },
    RoleDescriptor {
        role: Role::BloodMoonApostle,
        key: "bloodMoonApostle",
        faction: Faction::Werewolf,
        abilities: &[WolfKill, ObservesFirstNight, SelfDetonate, DetonationVoidsGood],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "Watch the pack on the first night, hunt with it after. Self-detonating at night voids every good-side action that night.",
    },
    RoleDescriptor {
        role: Role::Seer,
        key: "seer",
        faction: Faction::Good,
        abilities: &[Inspect],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "Each night, learn whether one player is hostile.",
    },
    RoleDescriptor {
        role: Role::Witch,
        key: "witch",
        faction: Faction::Good,
        abilities: &[Potions],
        night_eligible: true,
        antidotes: 1,
        poisons: 1,
        text: "You hold one antidote that saves the wolves' victim and one poison that kills.",
    },
    RoleDescriptor {
        role: Role::Hunter,
        key: "hunter",
        faction: Faction::Good,
        abilities: &[ShootOnVote],
        night_eligible: false,
        antidotes: 0,
        poisons: 0,
        text: "If voted out, you shoot the player you voted for.",
    },
    RoleDescriptor {
        role: Role::Guard,
        key: "guard",
        faction: Faction::Good,
        abilities: &[Guard],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "Each night, shield one player from the wolves. Never the same player twice in a row.",
    },
    RoleDescriptor {
        role: Role::Silencer,
        key: "silencer",
        faction: Faction::Good,
        abilities: &[Silence],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "Each night, silence one player for the next day. Never the same player twice in a row.",
    },
    RoleDescriptor {
        role: Role::Knight,
        key: "knight",
        faction: Faction::Good,
        abilities: &[Duel],
        night_eligible: false,
        antidotes: 0,
        poisons: 0,
        text: "Once per game, duel a player by day: a werewolf dies, anyone else costs you your life.",
    },
    RoleDescriptor {
        role: Role::Civilian,
        key: "civilian",
        faction: Faction::Civilian,
        abilities: &[],
        night_eligible: false,
        antidotes: 0,
        poisons: 0,
        text: "No ability. Find the wolves.",
    },
    RoleDescriptor {
        role: Role::OldRogue,
        key: "oldRogue",
        faction: Faction::Civilian,
        abilities: &[GeneralImmunity],
        night_eligible: false,
        antidotes: 0,
        poisons: 0,
        text: "Poison, silence and gunshots don't touch you.",
    },
    RoleDescriptor {
        role: Role::Bomber,
        key: "bomber",
        faction: Faction::Neutral,
        abilities: &[BlastVoters, InspectsHostile],
        night_eligible: false,
        antidotes: 0,
        poisons: 0,
        text: "If voted out, everyone who voted for you dies. Win by blasting away the last wolf or the last non-wolf.",
    },
    RoleDescriptor {
        role: Role::Idiot,
        key: "idiot",
        faction: Faction::Neutral,
        abilities: &[SurvivesVote],
        night_eligible: false,
        antidotes: 0,
        poisons: 0,
        text: "Being voted out only costs you your vote. Win by being one of the last two alive.",
    },
    RoleDescriptor {
        role: Role::Cupid,
        key: "cupid",
        faction: Faction::Neutral,
        abilities: &[PairLovers],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "On the first night, bind two players as lovers. They live and die together.",
    },
    RoleDescriptor {
        role: Role::WildChild,
        key: "wildChild",
        faction: Faction::Neutral,
        abilities: &[ChooseMentor],
        night_eligible: true,
        antidotes: 0,
        poisons: 0,
        text: "On the first night, pick a mentor. If your mentor dies, you become a werewolf.",
    },
];

/// Resolve a configuration key (`"seer"`, `"whiteWolf"`, ...) to its descriptor.
pub fn lookup(key: &str) -> Result<&'static RoleDescriptor, EngineError> {
    CATALOG
        .iter()
        .find(|d| d.key == key)
        .ok_or_else(|| EngineError::UnknownRole(key.to_string()))
}

impl Role {
    pub fn descriptor(self) -> &'static RoleDescriptor {
        &CATALOG[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    pub fn faction(self) -> Faction {
        self.descriptor().faction
    }

    pub fn has(self, ability: Ability) -> bool {
        self.descriptor().abilities.contains(&ability)
    }
}

/// Per-role mutable bookkeeping. Each variant carries only what its role
/// needs; everything else about a role is static and lives in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RoleState {
    Plain,
    Witch { antidotes: u8, poisons: u8 },
    Guard { last_target: Option<PlayerId> },
    Silencer { last_target: Option<PlayerId> },
    Knight { duel_used: bool },
    Detonator { used: bool },
    Cupid { paired: bool },
    WildChild { mentor: Option<PlayerId>, transformed: bool },
    Idiot { exposed: bool },
}

impl RoleState {
    pub fn initial(role: Role) -> Self {
        let d = role.descriptor();
        match role {
            Role::Witch => RoleState::Witch {
                antidotes: d.antidotes,
                poisons: d.poisons,
            },
            Role::Guard => RoleState::Guard { last_target: None },
            Role::Silencer => RoleState::Silencer { last_target: None },
            Role::Knight => RoleState::Knight { duel_used: false },
            Role::WhiteWolf | Role::BloodMoonApostle => RoleState::Detonator { used: false },
            Role::Cupid => RoleState::Cupid { paired: false },
            Role::WildChild => RoleState::WildChild {
                mentor: None,
                transformed: false,
            },
            Role::Idiot => RoleState::Idiot { exposed: false },
            _ => RoleState::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_indexed_by_role() {
        for (i, d) in CATALOG.iter().enumerate() {
            assert_eq!(d.role as usize, i, "{} out of place", d.key);
            assert_eq!(lookup(d.key).unwrap().role, d.role);
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert_eq!(
            lookup("vampire").unwrap_err(),
            EngineError::UnknownRole("vampire".into())
        );
    }

    #[test]
    fn witch_starts_with_one_of_each() {
        assert_eq!(
            RoleState::initial(Role::Witch),
            RoleState::Witch {
                antidotes: 1,
                poisons: 1
            }
        );
        assert_eq!(RoleState::initial(Role::Civilian), RoleState::Plain);
    }

    #[test]
    fn catalog_serde_keys_match() {
        for d in CATALOG.iter() {
            let json = serde_json::to_string(&d.role).unwrap();
            assert_eq!(json, format!("\"{}\"", d.key));
        }
    }
}
