use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{TechnologyId, Year, YearTable};

/// Yearly lifecycle action on a (site, technology) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleAction {
    Continue,
    Replace,
    Renew,
}

/// A process route a site can run
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Technology {
    pub id: TechnologyId,
    /// Years between mandatory replace/renew decisions
    #[validate(range(min = 1))]
    pub lifespan: u32,
    /// Earliest year the technology may be continued, replaced or renewed
    pub introduction_year: Year,
    /// Multiplier applied to fuel and feedstock emissions
    #[serde(default)]
    pub emission_intensity: YearTable,
    /// Capital cost per unit of production, charged in replace years
    #[serde(default)]
    pub capex: YearTable,
    /// Operating cost per unit of production, charged in every active year
    #[serde(default)]
    pub opex: YearTable,
    /// Refurbishment cost per unit of production, charged in renew years
    #[serde(default)]
    pub renewal: YearTable,
    /// Restricts the actions the optimizer may take. `None` allows all three.
    #[serde(default)]
    pub allowed_actions: Option<Vec<LifecycleAction>>,
}

impl Technology {
    pub fn new(id: impl Into<String>, lifespan: u32, introduction_year: Year) -> Self {
        Self {
            id: TechnologyId::new(id),
            lifespan,
            introduction_year,
            emission_intensity: YearTable::new(),
            capex: YearTable::new(),
            opex: YearTable::new(),
            renewal: YearTable::new(),
            allowed_actions: None,
        }
    }

    pub fn with_capex(mut self, capex: YearTable) -> Self {
        self.capex = capex;
        self
    }

    pub fn with_opex(mut self, opex: YearTable) -> Self {
        self.opex = opex;
        self
    }

    pub fn with_renewal(mut self, renewal: YearTable) -> Self {
        self.renewal = renewal;
        self
    }

    pub fn with_emission_intensity(mut self, ei: YearTable) -> Self {
        self.emission_intensity = ei;
        self
    }

    pub fn with_allowed_actions(mut self, actions: Vec<LifecycleAction>) -> Self {
        self.allowed_actions = Some(actions);
        self
    }

    pub fn allows(&self, action: LifecycleAction) -> bool {
        self.allowed_actions
            .as_ref()
            .map_or(true, |actions| actions.contains(&action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_actions_default_to_all() {
        let tech = Technology::new("BF-BOF", 20, 2000);
        assert!(tech.allows(LifecycleAction::Replace));

        let tech = tech.with_allowed_actions(vec![LifecycleAction::Continue, LifecycleAction::Renew]);
        assert!(!tech.allows(LifecycleAction::Replace));
        assert!(tech.allows(LifecycleAction::Renew));
    }

    #[test]
    fn test_zero_lifespan_is_rejected() {
        assert!(Technology::new("T", 0, 2020).validate().is_err());
    }

    #[test]
    fn test_action_parses_lowercase() {
        assert_eq!("renew".parse::<LifecycleAction>().unwrap(), LifecycleAction::Renew);
    }
}
