//! Tier classifier: point → tier, tier → floor.
//!
//! RULE: There is exactly one tier table per run. Both calculators and
//! the classifier read it from ScoringConfig; no threshold literal is
//! repeated anywhere else.

use crate::{
    error::{ScoringError, ScoringResult},
    types::{Point, SubjectKind, TierId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierBand {
    pub tier:           TierId,
    /// Minimum point required to hold this tier.
    pub floor:          Point,
    pub provider_label: String,
    pub client_label:   String,
}

/// Tier bands ordered low → high by tier id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierTable {
    pub bands: Vec<TierBand>,
}

impl Default for TierTable {
    fn default() -> Self {
        let band = |tier, floor, provider: &str, client: &str| TierBand {
            tier,
            floor,
            provider_label: provider.into(),
            client_label:   client.into(),
        };
        Self {
            bands: vec![
                band(0, 0,  "APPRENTICE",   "CASUAL"),
                band(1, 50, "PROFESSIONAL", "STANDARD"),
                band(2, 70, "EXPERT",       "PREMIUM"),
                band(3, 85, "MASTER",       "VIP"),
            ],
        }
    }
}

impl TierTable {
    /// The highest tier whose floor is at or below `point`.
    pub fn tier_of(&self, point: Point) -> TierId {
        self.bands
            .iter()
            .rev()
            .find(|b| point >= b.floor)
            .map(|b| b.tier)
            .unwrap_or(0)
    }

    /// The floor point of `tier`. Unknown tiers are an error, never a default.
    pub fn floor_of(&self, tier: TierId) -> ScoringResult<Point> {
        self.band(tier).map(|b| b.floor)
    }

    pub fn label(&self, kind: SubjectKind, tier: TierId) -> ScoringResult<&str> {
        let band = self.band(tier)?;
        Ok(match kind {
            SubjectKind::Provider => &band.provider_label,
            SubjectKind::Client   => &band.client_label,
        })
    }

    pub fn highest(&self) -> TierId {
        self.bands.last().map(|b| b.tier).unwrap_or(0)
    }

    /// Iterate every tier id, low → high.
    pub fn tiers(&self) -> impl Iterator<Item = TierId> + '_ {
        self.bands.iter().map(|b| b.tier)
    }

    /// A table must start at tier 0 with floor 0, use contiguous ids,
    /// and have strictly increasing floors. Otherwise tier_of and
    /// floor_of stop being inverses.
    pub fn validate(&self) -> ScoringResult<()> {
        let invalid = |reason: String| Err(ScoringError::InvalidConfig { reason });

        let Some(first) = self.bands.first() else {
            return invalid("tier table is empty".into());
        };
        if first.floor != 0 {
            return invalid(format!("tier 0 floor must be 0, got {}", first.floor));
        }
        for (i, band) in self.bands.iter().enumerate() {
            if band.tier as usize != i {
                return invalid(format!("tier ids must be 0..n in order, found {} at {i}", band.tier));
            }
        }
        for pair in self.bands.windows(2) {
            if pair[1].floor <= pair[0].floor {
                return invalid(format!(
                    "tier {} floor {} must exceed tier {} floor {}",
                    pair[1].tier, pair[1].floor, pair[0].tier, pair[0].floor
                ));
            }
        }
        Ok(())
    }

    fn band(&self, tier: TierId) -> ScoringResult<&TierBand> {
        self.bands
            .iter()
            .find(|b| b.tier == tier)
            .ok_or(ScoringError::InvalidTier { tier })
    }
}
