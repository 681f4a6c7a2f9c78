use serde::Serialize;

use super::role::{Ability, Faction, Role, RoleState};
use crate::types::PlayerId;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// 1-based seat number, stable for the whole game.
    pub seat: usize,
    pub role: Role,
    pub faction: Faction,
    pub is_alive: bool,
    pub can_vote: bool,
    pub silenced_today: bool,
    pub state: RoleState,
}

impl Player {
    pub fn new(id: PlayerId, name: String, seat: usize, role: Role) -> Self {
        Self {
            id,
            name,
            seat,
            role,
            faction: role.faction(),
            is_alive: true,
            can_vote: true,
            silenced_today: false,
            state: RoleState::initial(role),
        }
    }

    pub fn has(&self, ability: Ability) -> bool {
        self.role.has(ability)
    }

    pub fn is_werewolf(&self) -> bool {
        self.faction == Faction::Werewolf
    }

    pub fn is_immune(&self) -> bool {
        self.has(Ability::GeneralImmunity)
    }

    pub fn can_be_silenced(&self) -> bool {
        !self.is_immune()
    }

    /// What an inspector learns about this player.
    pub fn reads_hostile(&self) -> bool {
        self.is_werewolf() || self.has(Ability::InspectsHostile)
    }

    pub fn can_guard(&self) -> bool {
        self.is_alive && matches!(self.state, RoleState::Guard { .. })
    }

    pub fn can_silence(&self) -> bool {
        self.is_alive && matches!(self.state, RoleState::Silencer { .. })
    }

    pub fn can_duel(&self) -> bool {
        self.is_alive && matches!(self.state, RoleState::Knight { duel_used: false })
    }

    pub fn can_detonate(&self) -> bool {
        self.is_alive && matches!(self.state, RoleState::Detonator { used: false })
    }

    pub fn can_pair(&self) -> bool {
        self.is_alive && matches!(self.state, RoleState::Cupid { paired: false })
    }

    pub fn can_choose_mentor(&self) -> bool {
        self.is_alive && matches!(self.state, RoleState::WildChild { mentor: None, .. })
    }

    pub fn has_potion(&self) -> bool {
        self.is_alive
            && matches!(self.state, RoleState::Witch { antidotes, poisons } if antidotes + poisons > 0)
    }

    /// Whether this player gets a ballot in tonight's wolf kill.
    pub fn can_hunt(&self, day: u32) -> bool {
        self.is_alive
            && self.is_werewolf()
            && (self.has(Ability::WolfKill) || self.is_transformed())
            && !(day == 1 && self.has(Ability::ObservesFirstNight))
    }

    pub fn is_transformed(&self) -> bool {
        matches!(self.state, RoleState::WildChild { transformed: true, .. })
    }

    /// Target last shielded or silenced, for roles with a no-repeat rule.
    pub fn last_target(&self) -> Option<&PlayerId> {
        match &self.state {
            RoleState::Guard { last_target } | RoleState::Silencer { last_target } => {
                last_target.as_ref()
            }
            _ => None,
        }
    }

    pub fn remember_target(&mut self, target: &PlayerId) {
        if let RoleState::Guard { last_target } | RoleState::Silencer { last_target } =
            &mut self.state
        {
            *last_target = Some(target.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(role: Role) -> Player {
        Player::new("p".into(), "p".into(), 1, role)
    }

    #[test]
    fn faction_follows_role() {
        assert_eq!(mk(Role::WhiteWolf).faction, Faction::Werewolf);
        assert_eq!(mk(Role::Idiot).faction, Faction::Neutral);
        assert_eq!(mk(Role::OldRogue).faction, Faction::Civilian);
    }

    #[test]
    fn bomber_reads_hostile_despite_neutral_faction() {
        let bomber = mk(Role::Bomber);
        assert_eq!(bomber.faction, Faction::Neutral);
        assert!(bomber.reads_hostile());
        assert!(!mk(Role::Cupid).reads_hostile());
    }

    #[test]
    fn apostle_sits_out_first_night_only() {
        let apostle = mk(Role::BloodMoonApostle);
        assert!(!apostle.can_hunt(1));
        assert!(apostle.can_hunt(2));
        assert!(mk(Role::NormalWolf).can_hunt(1));
    }

    #[test]
    fn old_rogue_cannot_be_silenced() {
        assert!(!mk(Role::OldRogue).can_be_silenced());
        assert!(mk(Role::Seer).can_be_silenced());
    }
}
