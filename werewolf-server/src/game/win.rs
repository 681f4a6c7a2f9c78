use super::engine::Game;
use super::role::Ability;
use crate::types::Winner;

/// Decide whether the game is over. Pure: reads the roster, never writes it.
/// A winner already on record is returned as-is.
///
/// The bomber's blast is checked first, since it can only ever be the last
/// wolf or the last non-wolf it took. With no wolf left the village wins.
/// Otherwise a final pairing (the lovers, or the idiot among the last two)
/// beats the head-count that would hand the game to the wolves.
pub fn evaluate(game: &Game) -> Option<Winner> {
    if game.winner.is_some() {
        return game.winner;
    }
    if game.bomber_triumph {
        return Some(Winner::Bomber);
    }

    let alive: Vec<_> = game.players.iter().filter(|p| p.is_alive).collect();
    let wolves = alive.iter().filter(|p| p.is_werewolf()).count();
    let others = alive.len() - wolves;

    if wolves == 0 {
        return Some(Winner::Villagers);
    }

    if alive.len() == 2 {
        if let Some((a, b)) = &game.lovers {
            if game.is_alive(a) && game.is_alive(b) {
                return Some(Winner::Lovers);
            }
        }
        if alive.iter().any(|p| p.has(Ability::SurvivesVote)) {
            return Some(Winner::Idiot);
        }
    }

    if others <= wolves {
        return Some(Winner::Werewolves);
    }
    None
}
