use crate::body::Ring;

/// Rules configuration
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    /// Speed below which a piece counts as resting in a zone
    pub stillness_threshold: f64,
    /// Quiescence window after the last collision start (seconds)
    pub settle_debounce: f64,
    /// Delay before an illegal piece is pulled from the board (seconds)
    pub removal_grace: f64,
    /// Rack size per player at game start
    pub pieces_per_player: u32,
    /// Max horizontal offset from the center hole that still scores center
    pub center_capture_radius: f64,
    pub outer_points: u32,
    pub middle_points: u32,
    pub inner_points: u32,
    pub center_points: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            stillness_threshold: 0.2,
            settle_debounce: 5.0,
            removal_grace: 5.0,
            pieces_per_player: 5,
            center_capture_radius: 1.0,
            outer_points: 5,
            middle_points: 10,
            inner_points: 15,
            center_points: 20,
        }
    }
}

impl RulesConfig {
    /// Point value of a ring.
    pub fn points(&self, ring: Ring) -> u32 {
        match ring {
            Ring::Outer => self.outer_points,
            Ring::Middle => self.middle_points,
            Ring::Inner => self.inner_points,
            Ring::Center => self.center_points,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.stillness_threshold.is_finite() || self.stillness_threshold <= 0.0 {
            return Err("stillness_threshold must be finite and > 0".to_string());
        }
        if !self.settle_debounce.is_finite() || self.settle_debounce <= 0.0 {
            return Err("settle_debounce must be finite and > 0".to_string());
        }
        if !self.removal_grace.is_finite() || self.removal_grace < 0.0 {
            return Err("removal_grace must be finite and >= 0".to_string());
        }
        if self.pieces_per_player == 0 {
            return Err("pieces_per_player must be >= 1".to_string());
        }
        if !self.center_capture_radius.is_finite() || self.center_capture_radius <= 0.0 {
            return Err("center_capture_radius must be finite and > 0".to_string());
        }
        if self.outer_points > self.middle_points
            || self.middle_points > self.inner_points
            || self.inner_points > self.center_points
        {
            return Err("ring points must not decrease toward the center".to_string());
        }
        Ok(())
    }
}
