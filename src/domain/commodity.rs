use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{CommodityId, TechnologyId, Year, YearTable};

/// A fuel or a feedstock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commodity {
    pub id: CommodityId,
    /// Cost per unit consumed
    #[serde(default)]
    pub cost: YearTable,
    /// Consumption per unit of production; `production = consumption / efficiency`
    #[serde(default)]
    pub efficiency: YearTable,
    /// Emission per unit consumed
    #[serde(default)]
    pub emission_factor: YearTable,
    /// Not consumable before this year
    #[serde(default)]
    pub introduction_year: Option<Year>,
}

impl Commodity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: CommodityId::new(id),
            cost: YearTable::new(),
            efficiency: YearTable::new(),
            emission_factor: YearTable::new(),
            introduction_year: None,
        }
    }

    pub fn with_cost(mut self, cost: YearTable) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_efficiency(mut self, efficiency: YearTable) -> Self {
        self.efficiency = efficiency;
        self
    }

    pub fn with_emission_factor(mut self, factor: YearTable) -> Self {
        self.emission_factor = factor;
        self
    }

    pub fn introduced_in(mut self, year: Year) -> Self {
        self.introduction_year = Some(year);
        self
    }

    pub fn is_available(&self, year: Year) -> bool {
        self.introduction_year.map_or(true, |intro| year >= intro)
    }
}

/// Technology/commodity pair with its allowed consumption-share range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_share_range"))]
pub struct Compatibility {
    pub technology: TechnologyId,
    pub commodity: CommodityId,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_share: f64,
    #[serde(default = "full_share")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_share: f64,
}

fn full_share() -> f64 {
    1.0
}

fn validate_share_range(pair: &Compatibility) -> Result<(), validator::ValidationError> {
    if pair.min_share > pair.max_share {
        return Err(validator::ValidationError::new("min_share_exceeds_max_share"));
    }
    Ok(())
}

impl Compatibility {
    pub fn new(
        technology: impl Into<String>,
        commodity: impl Into<String>,
        min_share: f64,
        max_share: f64,
    ) -> Self {
        Self {
            technology: TechnologyId::new(technology),
            commodity: CommodityId::new(commodity),
            min_share,
            max_share,
        }
    }

    /// Unrestricted pair (share in [0, 1])
    pub fn any(technology: impl Into<String>, commodity: impl Into<String>) -> Self {
        Self::new(technology, commodity, 0.0, 1.0)
    }
}
