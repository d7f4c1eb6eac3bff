use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::body::{BodyTag, PieceId, PlayerId};
use crate::config::RulesConfig;
use crate::vec2::Vec2;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Physics world -> Engine ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum WorldMsg {
    #[serde(rename = "collision_start")]
    CollisionStart(CollisionMsg),
    #[serde(rename = "collision_active")]
    CollisionActive(CollisionMsg),
    #[serde(rename = "collision_end")]
    CollisionEnd(CollisionMsg),
    #[serde(rename = "drag_end")]
    DragEnd(DragEndMsg),
}

/// One collision pair notification for a physics tick.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CollisionMsg {
    pub a: BodyTag,
    pub b: BodyTag,
    /// Relative speed of the pair. Zones are static, so for zone contacts
    /// this is the piece's own speed.
    pub rel_speed: f64,
    pub pos_a: Vec2,
    pub pos_b: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct DragEndMsg {
    pub piece: PieceId,
}

// === Presentation layer -> Engine ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum UiMsg {
    #[serde(rename = "new_game")]
    NewGame,
    #[serde(rename = "set_player_name")]
    SetPlayerName(SetPlayerNameMsg),
    #[serde(rename = "adjust_score")]
    AdjustScore(AdjustScoreMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SetPlayerNameMsg {
    pub player: PlayerId,
    pub name: String,
}

/// Manual score correction from the score inputs. The only path by which a
/// score may decrease.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct AdjustScoreMsg {
    pub player: PlayerId,
    pub delta: i32,
}

// === Engine -> Physics world ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum WorldCmd {
    #[serde(rename = "add_body")]
    AddBody(AddBodyMsg),
    #[serde(rename = "remove_body")]
    RemoveBody(RemoveBodyMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct AddBodyMsg {
    pub piece: PieceId,
    pub owner: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct RemoveBodyMsg {
    pub piece: PieceId,
}

// === Engine -> Presentation layer ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum GameMsg {
    #[serde(rename = "game_started")]
    GameStarted(GameStartedMsg),
    #[serde(rename = "notice")]
    Notice(NoticeMsg),
    #[serde(rename = "score_changed")]
    ScoreChanged(ScoreChangedMsg),
    #[serde(rename = "players_state")]
    PlayersState(PlayersStateMsg),
    #[serde(rename = "no_pieces_remaining")]
    NoPiecesRemaining(NoPiecesMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GameStartedMsg {
    pub protocol_version: u32,
    pub config: RulesConfig,
    pub players: Vec<PlayerWire>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
}

/// Turn-change and rule-violation announcement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct NoticeMsg {
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ScoreChangedMsg {
    pub player: PlayerId,
    pub new_score: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct PlayersStateMsg {
    pub players: Vec<PlayerWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: PlayerId,
    pub name: String,
    pub turn: bool,
    pub score: i32,
    pub pieces_remaining: u32,
    pub pieces_on_board: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct NoPiecesMsg {
    pub player: PlayerId,
}
