use crokinole_shared::config::RulesConfig;

/// Engine configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub tick_rate_hz: u32,
    pub rng_seed: u64,
    pub rules: RulesConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            rng_seed: 42,
            rules: RulesConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 || self.tick_rate_hz > 240 {
            return Err("tick_rate_hz must be between 1 and 240".to_string());
        }
        self.rules.validate()
    }
}
