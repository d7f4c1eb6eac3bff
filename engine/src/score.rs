use crate::classify::Contact;
use crokinole_shared::body::{PieceId, PlayerId, Ring};
use crokinole_shared::config::RulesConfig;
use std::collections::BTreeMap;

/// Maps settled zone contacts to per-player score deltas.
///
/// A piece scores the innermost ring it rests in, once per zone entry: the
/// aggregator remembers the last ring credited per piece and only re-credits
/// when the piece comes to rest in a different ring.
#[derive(Debug, Default)]
pub struct ScoreAggregator {
    credited: BTreeMap<PieceId, Ring>,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the zone contacts of one settle window into score deltas.
    ///
    /// Pieces for which `forfeits` returns true (scheduled for removal, or
    /// already removed) contribute nothing.
    pub fn resolve(
        &mut self,
        config: &RulesConfig,
        contacts: &[Contact],
        owner_of: impl Fn(PieceId) -> Option<PlayerId>,
        forfeits: impl Fn(PieceId) -> bool,
    ) -> Vec<(PlayerId, u32)> {
        // Innermost resting ring per piece, never cumulative across rings.
        let mut resting: BTreeMap<PieceId, Ring> = BTreeMap::new();
        for contact in contacts {
            if let Contact::Zone { piece, ring } = *contact {
                let entry = resting.entry(piece).or_insert(ring);
                if ring > *entry {
                    *entry = ring;
                }
            }
        }

        let mut deltas: BTreeMap<PlayerId, u32> = BTreeMap::new();
        for (piece, ring) in resting {
            if forfeits(piece) {
                continue;
            }
            if self.credited.get(&piece) == Some(&ring) {
                continue;
            }
            let Some(owner) = owner_of(piece) else {
                continue;
            };
            self.credited.insert(piece, ring);
            *deltas.entry(owner).or_insert(0) += config.points(ring);
        }

        deltas.into_iter().collect()
    }

    /// Forget a removed piece so its credit does not linger.
    pub fn forget(&mut self, piece: PieceId) {
        self.credited.remove(&piece);
    }

    pub fn reset(&mut self) {
        self.credited.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RulesConfig {
        RulesConfig::default()
    }

    fn owner_p1(_: PieceId) -> Option<PlayerId> {
        Some(PlayerId::P1)
    }

    fn nobody_forfeits(_: PieceId) -> bool {
        false
    }

    fn zone(piece: u32, ring: Ring) -> Contact {
        Contact::Zone {
            piece: PieceId(piece),
            ring,
        }
    }

    #[test]
    fn single_ring_scores_its_value() {
        let mut agg = ScoreAggregator::new();
        let deltas = agg.resolve(
            &config(),
            &[zone(1, Ring::Middle)],
            owner_p1,
            nobody_forfeits,
        );
        assert_eq!(deltas, vec![(PlayerId::P1, 10)]);
    }

    #[test]
    fn innermost_ring_wins_never_cumulative() {
        let mut agg = ScoreAggregator::new();
        let deltas = agg.resolve(
            &config(),
            &[zone(1, Ring::Middle), zone(1, Ring::Inner)],
            owner_p1,
            nobody_forfeits,
        );
        assert_eq!(deltas, vec![(PlayerId::P1, 15)]);
    }

    #[test]
    fn resting_in_same_ring_next_window_is_not_recredited() {
        let mut agg = ScoreAggregator::new();
        let first = agg.resolve(&config(), &[zone(1, Ring::Inner)], owner_p1, nobody_forfeits);
        assert_eq!(first, vec![(PlayerId::P1, 15)]);
        let second = agg.resolve(&config(), &[zone(1, Ring::Inner)], owner_p1, nobody_forfeits);
        assert!(second.is_empty());
    }

    #[test]
    fn knocked_into_a_new_ring_credits_the_new_ring() {
        let mut agg = ScoreAggregator::new();
        agg.resolve(&config(), &[zone(1, Ring::Inner)], owner_p1, nobody_forfeits);
        let deltas = agg.resolve(&config(), &[zone(1, Ring::Outer)], owner_p1, nobody_forfeits);
        assert_eq!(deltas, vec![(PlayerId::P1, 5)]);
    }

    #[test]
    fn forfeiting_piece_contributes_nothing() {
        let mut agg = ScoreAggregator::new();
        let deltas = agg.resolve(&config(), &[zone(1, Ring::Center)], owner_p1, |p| {
            p == PieceId(1)
        });
        assert!(deltas.is_empty());
    }

    #[test]
    fn deltas_accumulate_per_owner() {
        let mut agg = ScoreAggregator::new();
        let owner = |p: PieceId| {
            if p.0 < 10 {
                Some(PlayerId::P1)
            } else {
                Some(PlayerId::P2)
            }
        };
        let deltas = agg.resolve(
            &config(),
            &[
                zone(1, Ring::Outer),
                zone(2, Ring::Middle),
                zone(10, Ring::Center),
            ],
            owner,
            nobody_forfeits,
        );
        assert_eq!(deltas, vec![(PlayerId::P1, 15), (PlayerId::P2, 20)]);
    }

    #[test]
    fn forget_allows_recredit_after_removal() {
        let mut agg = ScoreAggregator::new();
        agg.resolve(&config(), &[zone(1, Ring::Inner)], owner_p1, nobody_forfeits);
        agg.forget(PieceId(1));
        let deltas = agg.resolve(&config(), &[zone(1, Ring::Inner)], owner_p1, nobody_forfeits);
        assert_eq!(deltas, vec![(PlayerId::P1, 15)]);
    }

    #[test]
    fn reset_clears_all_credit() {
        let mut agg = ScoreAggregator::new();
        agg.resolve(&config(), &[zone(1, Ring::Inner)], owner_p1, nobody_forfeits);
        agg.reset();
        let deltas = agg.resolve(&config(), &[zone(1, Ring::Inner)], owner_p1, nobody_forfeits);
        assert_eq!(deltas, vec![(PlayerId::P1, 15)]);
    }
}
