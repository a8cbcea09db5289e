use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::{CommodityId, CommodityKind, SiteId, TechnologyId, Year};

/// One entry of a baseline fuel or feedstock mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MixShare {
    pub commodity: CommodityId,
    #[validate(range(min = 0.0, max = 1.0))]
    pub share: f64,
}

impl MixShare {
    pub fn new(commodity: impl Into<String>, share: f64) -> Self {
        Self {
            commodity: CommodityId::new(commodity),
            share,
        }
    }
}

/// A production site and its baseline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Site {
    pub id: SiteId,
    /// Technology in operation during the baseline year
    pub technology: TechnologyId,
    /// Year the baseline technology was installed; lifespan cycles count from here
    pub introduced_year: Year,
    /// Default annual production target
    #[validate(range(min = 0.0))]
    pub production: f64,
    /// Per-year overrides of `production`
    #[serde(default)]
    pub production_by_year: BTreeMap<Year, f64>,
    #[serde(default)]
    #[validate(nested)]
    pub fuels: Vec<MixShare>,
    #[serde(default)]
    #[validate(nested)]
    pub feedstocks: Vec<MixShare>,
}

impl Site {
    pub fn new(
        id: impl Into<String>,
        technology: impl Into<String>,
        introduced_year: Year,
        production: f64,
    ) -> Self {
        Self {
            id: SiteId::new(id),
            technology: TechnologyId::new(technology),
            introduced_year,
            production,
            production_by_year: BTreeMap::new(),
            fuels: Vec::new(),
            feedstocks: Vec::new(),
        }
    }

    pub fn with_fuel(mut self, commodity: impl Into<String>, share: f64) -> Self {
        self.fuels.push(MixShare::new(commodity, share));
        self
    }

    pub fn with_feedstock(mut self, commodity: impl Into<String>, share: f64) -> Self {
        self.feedstocks.push(MixShare::new(commodity, share));
        self
    }

    pub fn with_production_in(mut self, year: Year, production: f64) -> Self {
        self.production_by_year.insert(year, production);
        self
    }

    /// Production target for `year`
    pub fn target(&self, year: Year) -> f64 {
        self.production_by_year
            .get(&year)
            .copied()
            .unwrap_or(self.production)
    }

    /// Baseline mix of one commodity kind
    pub fn mix(&self, kind: CommodityKind) -> &[MixShare] {
        match kind {
            CommodityKind::Fuel => &self.fuels,
            CommodityKind::Feedstock => &self.feedstocks,
        }
    }

    pub fn share_total(&self, kind: CommodityKind) -> f64 {
        self.mix(kind).iter().map(|m| m.share).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_override() {
        let site = Site::new("S1", "T1", 2020, 1000.0).with_production_in(2030, 0.0);
        assert_eq!(site.target(2029), 1000.0);
        assert_eq!(site.target(2030), 0.0);
    }

    #[test]
    fn test_share_total_per_kind() {
        let site = Site::new("S1", "T1", 2020, 1000.0)
            .with_fuel("coal", 0.7)
            .with_fuel("gas", 0.2)
            .with_feedstock("ore", 1.0);
        assert!((site.share_total(CommodityKind::Fuel) - 0.9).abs() < 1e-12);
        assert_eq!(site.mix(CommodityKind::Feedstock).len(), 1);
    }

    #[test]
    fn test_share_out_of_range_is_rejected() {
        let site = Site::new("S1", "T1", 2020, 1000.0).with_fuel("coal", 1.4);
        assert!(site.validate().is_err());
    }
}
