use crokinole_shared::body::{PieceId, PlayerId};
use std::collections::{HashSet, VecDeque};

/// One of the two player records.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub turn: bool,
    pub score: i32,
    /// Pieces waiting to be placed, in placement order.
    pub rack: VecDeque<PieceId>,
    /// Pieces currently on the board.
    pub on_board: HashSet<PieceId>,
}

impl Player {
    fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            turn: false,
            score: 0,
            rack: VecDeque::new(),
            on_board: HashSet::new(),
        }
    }
}

/// Both player records. During an active game exactly one `turn` flag is set.
#[derive(Debug, Clone)]
pub struct PlayerRegistry {
    players: [Player; 2],
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            players: [
                Player::new(PlayerId::P1, "Player 1"),
                Player::new(PlayerId::P2, "Player 2"),
            ],
        }
    }

    fn index(id: PlayerId) -> usize {
        match id {
            PlayerId::P1 => 0,
            PlayerId::P2 => 1,
        }
    }

    pub fn get(&self, id: PlayerId) -> &Player {
        &self.players[Self::index(id)]
    }

    pub fn get_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[Self::index(id)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// The player whose turn it is, if a game is running.
    pub fn active(&self) -> Option<PlayerId> {
        self.players.iter().find(|p| p.turn).map(|p| p.id)
    }

    /// Give the turn to `id`, clearing the other flag.
    pub fn set_initial_turn(&mut self, id: PlayerId) {
        for player in &mut self.players {
            player.turn = player.id == id;
        }
    }

    /// Hand the turn to the other player. Returns the new active player.
    pub fn switch_turn(&mut self) -> Option<PlayerId> {
        let current = self.active()?;
        let next = current.other();
        self.get_mut(current).turn = false;
        self.get_mut(next).turn = true;
        Some(next)
    }

    /// Total pieces on the board across both players.
    pub fn pieces_on_board(&self) -> usize {
        self.players.iter().map(|p| p.on_board.len()).sum()
    }

    /// Reset for a new game: scores to zero, racks and boards cleared, no
    /// turn assigned. Names survive a reset.
    pub fn reset(&mut self) {
        for player in &mut self.players {
            player.turn = false;
            player.score = 0;
            player.rack.clear();
            player.on_board.clear();
        }
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
