use crate::{
    error::{ScoringError, ScoringResult},
    tier::TierTable,
    types::Point,
};
use serde::{Deserialize, Serialize};

// ── Provider performance ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderWeights {
    pub engagement:  f64,
    pub rating:      f64,
    pub completion:  f64,
    pub reliability: f64,
    pub earning:     f64,
}

impl Default for ProviderWeights {
    fn default() -> Self {
        Self {
            engagement:  0.30,
            rating:      0.25,
            completion:  0.20,
            reliability: 0.15,
            earning:     0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderScoring {
    pub weights:            ProviderWeights,
    /// Engagement points per delivered package.
    pub points_per_package: i64,
    /// Rating points per whole star of the average rating.
    pub points_per_star:    i64,
    /// Confidence points per received rating, capped at `rating_count_cap`.
    pub points_per_rating:  i64,
    pub rating_count_cap:   i64,
    /// Earning points per `revenue_unit` of revenue.
    pub points_per_revenue_unit: f64,
    pub revenue_unit:       f64,
}

impl Default for ProviderScoring {
    fn default() -> Self {
        Self {
            weights:                 ProviderWeights::default(),
            points_per_package:      20,
            points_per_star:         20,
            points_per_rating:       2,
            rating_count_cap:        20,
            points_per_revenue_unit: 10.0,
            revenue_unit:            500_000.0,
        }
    }
}

// ── Client potential ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientWeights {
    pub loyalty:     f64,
    pub value:       f64,
    pub reliability: f64,
}

impl Default for ClientWeights {
    fn default() -> Self {
        Self {
            loyalty:     0.40,
            value:       0.35,
            reliability: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientScoring {
    pub weights:            ClientWeights,
    /// Loyalty points per booking request.
    pub points_per_request: i64,
    /// Value points per `spend_unit` of average spend per request.
    pub points_per_spend_unit: f64,
    pub spend_unit:         f64,
}

impl Default for ClientScoring {
    fn default() -> Self {
        Self {
            weights:               ClientWeights::default(),
            points_per_request:    10,
            points_per_spend_unit: 10.0,
            spend_unit:            100_000.0,
        }
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub tiers:         TierTable,
    pub provider:      ProviderScoring,
    pub client:        ClientScoring,
    /// Upper clamp for every point.
    pub point_ceiling: Point,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tiers:         TierTable::default(),
            provider:      ProviderScoring::default(),
            client:        ClientScoring::default(),
            point_ceiling: 100,
        }
    }
}

impl ScoringConfig {
    /// Load from a JSON file. Omitted sections keep their defaults.
    /// In tests, use ScoringConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ScoringConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        log::info!(
            "Loaded scoring config from {path} ({} tiers, ceiling {})",
            config.tiers.bands.len(),
            config.point_ceiling
        );
        Ok(config)
    }

    pub fn validate(&self) -> ScoringResult<()> {
        self.tiers.validate()?;

        let top_floor = self.tiers.bands.last().map(|b| b.floor).unwrap_or(0);
        if self.point_ceiling < top_floor {
            return Err(ScoringError::InvalidConfig {
                reason: format!(
                    "point ceiling {} is below the top tier floor {top_floor}",
                    self.point_ceiling
                ),
            });
        }

        let p = &self.provider.weights;
        check_weights(
            "provider",
            &[p.engagement, p.rating, p.completion, p.reliability, p.earning],
        )?;
        let c = &self.client.weights;
        check_weights("client", &[c.loyalty, c.value, c.reliability])?;

        if !(self.provider.revenue_unit > 0.0) || !(self.client.spend_unit > 0.0) {
            return Err(ScoringError::InvalidConfig {
                reason: "revenue_unit and spend_unit must be positive".into(),
            });
        }
        Ok(())
    }
}

fn check_weights(kind: &str, weights: &[f64]) -> ScoringResult<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ScoringError::InvalidConfig {
            reason: format!("{kind} weights must be finite and non-negative"),
        });
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(ScoringError::InvalidConfig {
            reason: format!("{kind} weights must sum to 1.0, got {total:.4}"),
        });
    }
    Ok(())
}
