use crate::domain::CommodityKind;

use super::linear::{VarKind, VarRegistry};
use super::sets::{
    IndexSets, SiteCommodityYear, SiteTechCommodityYear, SiteTechYear, SiteYear, VarMap,
};

/// Selection, consumption and attribution variables for one commodity kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommodityVars {
    pub select: VarMap<SiteCommodityYear>,
    pub consumption: VarMap<SiteCommodityYear>,
    /// `active[tech] × consumption[commodity]`
    pub active_consumption: VarMap<SiteTechCommodityYear>,
}

/// Every decision and auxiliary variable of the model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    pub continue_: VarMap<SiteTechYear>,
    pub replace: VarMap<SiteTechYear>,
    pub renew: VarMap<SiteTechYear>,
    pub active: VarMap<SiteTechYear>,
    pub activation_change: VarMap<SiteTechYear>,
    pub production: VarMap<SiteYear>,
    pub emission_by_tech: VarMap<SiteTechYear>,
    /// `active × production`
    pub prod_active: VarMap<SiteTechYear>,
    /// `replace × production`
    pub replace_prod_active: VarMap<SiteTechYear>,
    /// `renew × production`
    pub renew_prod_active: VarMap<SiteTechYear>,
    pub fuel: CommodityVars,
    pub feedstock: CommodityVars,
}

impl Variables {
    /// Declare all variables site by site, in a fixed order
    pub fn declare(sets: &IndexSets, registry: &mut VarRegistry) -> Self {
        let mut vars = Variables::default();
        let years = &sets.years;

        for (site, site_id) in sets.sites.iter().enumerate() {
            for (t, year) in years.iter().enumerate() {
                let key = SiteYear { site, t };
                vars.production.insert(
                    key,
                    registry.add(format!("production[{site_id},{year}]"), VarKind::NonNegative),
                );
            }

            for (tech, tech_id) in sets.technologies.iter().enumerate() {
                for (t, year) in years.iter().enumerate() {
                    let key = SiteTechYear { site, tech, t };
                    let idx = format!("{site_id},{tech_id},{year}");
                    let mut binary = |map: &mut VarMap<SiteTechYear>, name: &str| {
                        map.insert(key, registry.add(format!("{name}[{idx}]"), VarKind::Binary));
                    };
                    binary(&mut vars.continue_, "continue");
                    binary(&mut vars.replace, "replace");
                    binary(&mut vars.renew, "renew");
                    binary(&mut vars.active, "active");
                    binary(&mut vars.activation_change, "activation_change");

                    let mut continuous = |map: &mut VarMap<SiteTechYear>, name: &str| {
                        map.insert(key, registry.add(format!("{name}[{idx}]"), VarKind::NonNegative));
                    };
                    continuous(&mut vars.emission_by_tech, "emission_by_tech");
                    continuous(&mut vars.prod_active, "prod_active");
                    continuous(&mut vars.replace_prod_active, "replace_prod_active");
                    continuous(&mut vars.renew_prod_active, "renew_prod_active");
                }
            }

            for kind in [CommodityKind::Fuel, CommodityKind::Feedstock] {
                let commodities = sets.commodities(kind);
                let pool = match kind {
                    CommodityKind::Fuel => &mut vars.fuel,
                    CommodityKind::Feedstock => &mut vars.feedstock,
                };
                for (commodity, commodity_id) in commodities.iter().enumerate() {
                    for (t, year) in years.iter().enumerate() {
                        let key = SiteCommodityYear { site, commodity, t };
                        pool.select.insert(
                            key,
                            registry.add(
                                format!("{kind}_select[{site_id},{commodity_id},{year}]"),
                                VarKind::Binary,
                            ),
                        );
                        pool.consumption.insert(
                            key,
                            registry.add(
                                format!("{kind}_consumption[{site_id},{commodity_id},{year}]"),
                                VarKind::NonNegative,
                            ),
                        );
                    }
                }
                for (tech, tech_id) in sets.technologies.iter().enumerate() {
                    for (commodity, commodity_id) in commodities.iter().enumerate() {
                        for (t, year) in years.iter().enumerate() {
                            pool.active_consumption.insert(
                                SiteTechCommodityYear { site, tech, commodity, t },
                                registry.add(
                                    format!(
                                        "active_{kind}_consumption[{site_id},{tech_id},{commodity_id},{year}]"
                                    ),
                                    VarKind::NonNegative,
                                ),
                            );
                        }
                    }
                }
            }
        }

        vars
    }

    pub fn commodity(&self, kind: CommodityKind) -> &CommodityVars {
        match kind {
            CommodityKind::Fuel => &self.fuel,
            CommodityKind::Feedstock => &self.feedstock,
        }
    }
}
