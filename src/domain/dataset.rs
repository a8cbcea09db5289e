use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use validator::Validate;

use super::{
    Commodity, CommodityId, CommodityKind, Compatibility, Site, SiteId, Technology,
    TechnologyId, Year, YearTable,
};
use crate::error::PlanningError;

/// Shares are compared against 1 with this slack
pub const SHARE_TOLERANCE: f64 = 1e-6;

/// Every input table the planner consumes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningData {
    pub years: Vec<Year>,
    pub sites: Vec<Site>,
    pub technologies: Vec<Technology>,
    #[serde(default)]
    pub fuels: Vec<Commodity>,
    #[serde(default)]
    pub feedstocks: Vec<Commodity>,
    #[serde(default)]
    pub technology_fuels: Vec<Compatibility>,
    #[serde(default)]
    pub technology_feedstocks: Vec<Compatibility>,
    /// Global annual emission cap; years not listed are uncapped
    #[serde(default)]
    pub emission_limits: YearTable,
    #[serde(default)]
    pub site_emission_limits: BTreeMap<SiteId, YearTable>,
    #[serde(default)]
    pub carbon_price: YearTable,
}

impl PlanningData {
    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PlanningError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&std::fs::read_to_string(path)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&std::fs::read_to_string(path)?)?),
            other => Err(PlanningError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, PlanningError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Sorted, de-duplicated horizon
    pub fn horizon(&self) -> Vec<Year> {
        self.years
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn baseline_year(&self) -> Option<Year> {
        self.years.iter().copied().min()
    }

    pub fn technology(&self, id: &TechnologyId) -> Option<&Technology> {
        self.technologies.iter().find(|t| &t.id == id)
    }

    pub fn commodities(&self, kind: CommodityKind) -> &[Commodity] {
        match kind {
            CommodityKind::Fuel => &self.fuels,
            CommodityKind::Feedstock => &self.feedstocks,
        }
    }

    pub fn compatibility(&self, kind: CommodityKind) -> &[Compatibility] {
        match kind {
            CommodityKind::Fuel => &self.technology_fuels,
            CommodityKind::Feedstock => &self.technology_feedstocks,
        }
    }

    /// Check every invariant the model relies on and report all violations at once
    pub fn validate(&self) -> Result<(), PlanningError> {
        let issues = self.collect_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(PlanningError::InvalidData(issues))
        }
    }

    fn collect_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let Some(baseline_year) = self.baseline_year() else {
            issues.push("no planning years given".to_string());
            return issues;
        };
        if self.sites.is_empty() {
            issues.push("no sites given".to_string());
        }
        if self.technologies.is_empty() {
            issues.push("no technologies given".to_string());
        }

        check_unique(&mut issues, "site", self.sites.iter().map(|s| s.id.as_str()));
        check_unique(
            &mut issues,
            "technology",
            self.technologies.iter().map(|t| t.id.as_str()),
        );
        for kind in [CommodityKind::Fuel, CommodityKind::Feedstock] {
            check_unique(
                &mut issues,
                kind.as_ref(),
                self.commodities(kind).iter().map(|c| c.id.as_str()),
            );
        }

        for tech in &self.technologies {
            if let Err(e) = tech.validate() {
                issues.push(format!("technology {}: {}", tech.id, flatten(&e)));
            }
        }

        for kind in [CommodityKind::Fuel, CommodityKind::Feedstock] {
            for commodity in self.commodities(kind) {
                for (year, eff) in commodity.efficiency.iter() {
                    if !(eff.is_finite() && eff > 0.0) {
                        issues.push(format!(
                            "{kind} {}: efficiency in {year} must be positive, got {eff}",
                            commodity.id
                        ));
                    }
                }
            }
            self.check_compatibility(&mut issues, kind);
        }

        for site in &self.sites {
            self.check_site(&mut issues, site, baseline_year);
        }

        for site in self.site_emission_limits.keys() {
            if !self.sites.iter().any(|s| &s.id == site) {
                issues.push(format!("site emission limit given for unknown site {site}"));
            }
        }

        issues
    }

    fn check_compatibility(&self, issues: &mut Vec<String>, kind: CommodityKind) {
        let mut seen = BTreeSet::new();
        for pair in self.compatibility(kind) {
            if self.technology(&pair.technology).is_none() {
                issues.push(format!(
                    "technology-{kind} pair references unknown technology {}",
                    pair.technology
                ));
            }
            if !self.commodities(kind).iter().any(|c| c.id == pair.commodity) {
                issues.push(format!(
                    "technology-{kind} pair references unknown {kind} {}",
                    pair.commodity
                ));
            }
            if let Err(e) = pair.validate() {
                issues.push(format!(
                    "technology-{kind} pair ({}, {}): {}",
                    pair.technology,
                    pair.commodity,
                    flatten(&e)
                ));
            }
            if !seen.insert((&pair.technology, &pair.commodity)) {
                issues.push(format!(
                    "technology-{kind} pair ({}, {}) listed twice",
                    pair.technology, pair.commodity
                ));
            }
        }

        // a running technology must be able to split its consumption within the bounds
        let mut totals: BTreeMap<&TechnologyId, (f64, f64)> = BTreeMap::new();
        for pair in self.compatibility(kind) {
            let entry = totals.entry(&pair.technology).or_insert((0.0, 0.0));
            entry.0 += pair.min_share;
            entry.1 += pair.max_share;
        }
        for (tech, (min_total, max_total)) in totals {
            if min_total > 1.0 + SHARE_TOLERANCE {
                issues.push(format!(
                    "technology {tech}: {kind} min_share values sum to {min_total}, above 1"
                ));
            }
            if max_total < 1.0 - SHARE_TOLERANCE {
                issues.push(format!(
                    "technology {tech}: {kind} max_share values sum to {max_total}, below 1"
                ));
            }
        }
    }

    fn check_site(&self, issues: &mut Vec<String>, site: &Site, baseline_year: Year) {
        if let Err(e) = site.validate() {
            issues.push(format!("site {}: {}", site.id, flatten(&e)));
        }
        for (year, target) in &site.production_by_year {
            if !(target.is_finite() && *target >= 0.0) {
                issues.push(format!(
                    "site {}: production target in {year} must be non-negative, got {target}",
                    site.id
                ));
            }
        }

        match self.technology(&site.technology) {
            None => issues.push(format!(
                "site {}: baseline technology {} is not in the technology catalogue",
                site.id, site.technology
            )),
            Some(tech) => {
                if tech.introduction_year > baseline_year {
                    issues.push(format!(
                        "site {}: technology {} is used in {baseline_year} before its introduction year {}",
                        site.id, tech.id, tech.introduction_year
                    ));
                }
            }
        }
        if site.introduced_year > baseline_year {
            issues.push(format!(
                "site {}: baseline technology installed in {} after the baseline year {baseline_year}",
                site.id, site.introduced_year
            ));
        }

        for kind in [CommodityKind::Fuel, CommodityKind::Feedstock] {
            self.check_mix(issues, site, kind, baseline_year);
        }
    }

    fn check_mix(
        &self,
        issues: &mut Vec<String>,
        site: &Site,
        kind: CommodityKind,
        baseline_year: Year,
    ) {
        let mix = site.mix(kind);
        let total = site.share_total(kind);
        if total > 1.0 + SHARE_TOLERANCE {
            issues.push(format!(
                "site {}: baseline {kind} shares sum to {total:.6} (> 1)",
                site.id
            ));
        }
        if mix.is_empty() && site.target(baseline_year) > 0.0 {
            issues.push(format!(
                "site {}: baseline {kind} mix is empty but the site produces in {baseline_year}",
                site.id
            ));
        }

        let mut seen = BTreeSet::new();
        for entry in mix {
            if !seen.insert(&entry.commodity) {
                issues.push(format!(
                    "site {}: baseline {kind} {} listed twice",
                    site.id, entry.commodity
                ));
            }
            let Some(commodity) = self.commodities(kind).iter().find(|c| c.id == entry.commodity)
            else {
                issues.push(format!(
                    "site {}: baseline {kind} {} is not in the {kind} catalogue",
                    site.id, entry.commodity
                ));
                continue;
            };
            if !commodity.is_available(baseline_year) {
                issues.push(format!(
                    "site {}: baseline {kind} {} is used before its introduction year",
                    site.id, entry.commodity
                ));
            }
            if !self.is_compatible(kind, &site.technology, &entry.commodity) {
                issues.push(format!(
                    "site {}: baseline {kind} {} is not compatible with technology {}",
                    site.id, entry.commodity, site.technology
                ));
            }
        }
    }

    /// A technology with no rows for `kind` accepts every commodity of that kind
    pub fn is_compatible(
        &self,
        kind: CommodityKind,
        technology: &TechnologyId,
        commodity: &CommodityId,
    ) -> bool {
        let mut rows = self
            .compatibility(kind)
            .iter()
            .filter(|p| &p.technology == technology)
            .peekable();
        if rows.peek().is_none() {
            return true;
        }
        rows.any(|p| &p.commodity == commodity)
    }
}

fn check_unique<'a>(issues: &mut Vec<String>, what: &str, ids: impl Iterator<Item = &'a str>) {
    let mut seen = BTreeSet::new();
    for id in ids {
        if id.is_empty() {
            issues.push(format!("{what} with an empty id"));
        } else if !seen.insert(id) {
            issues.push(format!("duplicate {what} id {id}"));
        }
    }
}

fn flatten(errors: &validator::ValidationErrors) -> String {
    errors.to_string().replace('\n', "; ")
}
