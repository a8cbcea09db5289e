use serde::{Deserialize, Serialize};
use validator::Validate;

/// How emissions enter the model. Cap and carbon price never coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EmissionControl {
    /// Hard annual limits from the emission-limit tables
    #[default]
    Cap,
    /// Emissions priced in the objective, no limits
    CarbonPrice,
    /// Emissions only accounted
    Unconstrained,
}

/// Number of commodities of one kind a site must select in an operating year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SelectionRule {
    #[default]
    AtLeastOne,
    ExactlyOne,
}

/// Policy switches applied while building the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ModelOptions {
    pub emission_control: EmissionControl,
    /// Permit `replace` on the technology that was active the year before
    pub allow_replace_same_technology: bool,
    /// Upper bound on renew events per (site, technology) over the horizon
    pub max_renew: Option<u32>,
    pub fuel_selection: SelectionRule,
    pub feedstock_selection: SelectionRule,
    /// Objective weight `(1 + r)^-(year - baseline)`; undiscounted when unset
    #[validate(range(min = 0.0, max = 1.0))]
    pub discount_rate: Option<f64>,
    /// Replaces the data-derived Big-M
    #[validate(range(exclusive_min = 0.0))]
    pub big_m: Option<f64>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            emission_control: EmissionControl::Cap,
            allow_replace_same_technology: false,
            max_renew: Some(10),
            fuel_selection: SelectionRule::AtLeastOne,
            feedstock_selection: SelectionRule::AtLeastOne,
            discount_rate: None,
            big_m: None,
        }
    }
}

impl ModelOptions {
    pub fn with_emission_control(mut self, mode: EmissionControl) -> Self {
        self.emission_control = mode;
        self
    }
}
