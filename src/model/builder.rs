use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};
use validator::Validate;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::domain::{CommodityKind, PlanningData, Year};
use crate::error::PlanningError;

use super::linear::{Constraint, ConstraintFamily, LinearExpr, VarRegistry};
use super::options::{ModelOptions, SelectionRule};
use super::parameters::{DefaultedLookup, Parameters};
use super::sets::IndexSets;
use super::variables::Variables;
use super::{emission, lifecycle, objective, production};

/// Read-only view shared by the constraint generators
pub struct ModelContext<'a> {
    pub sets: &'a IndexSets,
    pub params: &'a Parameters,
    pub vars: &'a Variables,
    pub options: &'a ModelOptions,
    pub big_m: f64,
}

impl ModelContext<'_> {
    pub fn year(&self, t: usize) -> Year {
        self.sets.years[t]
    }

    pub fn target(&self, site: usize, t: usize) -> f64 {
        self.params.target[site][t]
    }

    /// Production resumes after a zero-target year
    pub fn is_late_restart(&self, site: usize, t: usize) -> bool {
        t > 0 && self.target(site, t - 1) <= 0.0 && self.target(site, t) > 0.0
    }

    pub fn selection_rule(&self, kind: CommodityKind) -> SelectionRule {
        match kind {
            CommodityKind::Fuel => self.options.fuel_selection,
            CommodityKind::Feedstock => self.options.feedstock_selection,
        }
    }

    /// `site,tech,year` or `site,year`, used in constraint labels
    pub fn tag(&self, site: usize, tech: Option<usize>, t: usize) -> String {
        match tech {
            Some(tech) => format!(
                "{},{},{}",
                self.sets.sites[site],
                self.sets.technologies[tech],
                self.year(t)
            ),
            None => format!("{},{}", self.sets.sites[site], self.year(t)),
        }
    }

    pub fn commodity_tag(&self, kind: CommodityKind, site: usize, commodity: usize, t: usize) -> String {
        format!(
            "{},{},{}",
            self.sets.sites[site],
            self.sets.commodities(kind)[commodity],
            self.year(t)
        )
    }

    pub fn pair_tag(
        &self,
        kind: CommodityKind,
        site: usize,
        tech: usize,
        commodity: usize,
        t: usize,
    ) -> String {
        format!(
            "{},{},{},{}",
            self.sets.sites[site],
            self.sets.technologies[tech],
            self.sets.commodities(kind)[commodity],
            self.year(t)
        )
    }
}

/// The assembled MILP. Built once and only read afterwards.
#[derive(Debug, Clone)]
pub struct PlanningModel {
    pub sets: IndexSets,
    pub params: Parameters,
    pub vars: Variables,
    pub registry: VarRegistry,
    /// Site blocks in site order, then the cross-site caps
    pub constraints: Vec<Constraint>,
    pub objective: LinearExpr,
    pub options: ModelOptions,
    pub big_m: f64,
}

impl PlanningModel {
    #[instrument(name = "build_model", skip_all, fields(sites = data.sites.len(), years = data.years.len()))]
    pub fn build(data: &PlanningData, options: &ModelOptions) -> Result<Self, PlanningError> {
        data.validate()?;
        options
            .validate()
            .map_err(|e| PlanningError::InvalidData(vec![format!("model options: {e}")]))?;

        let sets = IndexSets::from_data(data);
        let params = Parameters::from_data(data, &sets, options)?;
        let big_m = params.big_m(options);
        let mut registry = VarRegistry::new();
        let vars = Variables::declare(&sets, &mut registry);

        let ctx = ModelContext {
            sets: &sets,
            params: &params,
            vars: &vars,
            options,
            big_m,
        };

        let blocks = site_blocks(&ctx);
        let mut constraints: Vec<Constraint> = blocks.into_iter().flatten().collect();
        emission::global_caps(&ctx, &mut constraints);
        let objective = objective::build(&ctx);

        let model = Self {
            sets,
            params,
            vars,
            registry,
            constraints,
            objective,
            options: options.clone(),
            big_m,
        };

        info!(
            variables = model.registry.len(),
            binaries = model.registry.binary_count(),
            constraints = model.constraints.len(),
            big_m = model.big_m,
            emission_control = %model.options.emission_control,
            "model assembled"
        );
        for (family, count) in model.family_counts() {
            debug!(%family, count, "constraints generated");
        }
        Ok(model)
    }

    pub fn defaulted_lookups(&self) -> &[DefaultedLookup] {
        &self.params.defaulted
    }

    pub fn family_counts(&self) -> BTreeMap<ConstraintFamily, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.constraints {
            *counts.entry(c.family).or_insert(0) += 1;
        }
        counts
    }

    pub fn families(&self) -> BTreeSet<ConstraintFamily> {
        self.constraints.iter().map(|c| c.family).collect()
    }

    /// Copy of the model without the constraints of `excluded`
    pub fn without_families(&self, excluded: &BTreeSet<ConstraintFamily>) -> Self {
        let mut model = self.clone();
        model.constraints.retain(|c| !excluded.contains(&c.family));
        model
    }

    pub fn baseline_year(&self) -> Year {
        self.sets.baseline_year()
    }
}

fn site_block(ctx: &ModelContext<'_>, site: usize) -> Vec<Constraint> {
    let mut out = Vec::new();
    lifecycle::site_constraints(ctx, site, &mut out);
    production::site_constraints(ctx, site, &mut out);
    emission::site_constraints(ctx, site, &mut out);
    out
}

#[cfg(feature = "parallel")]
fn site_blocks(ctx: &ModelContext<'_>) -> Vec<Vec<Constraint>> {
    (0..ctx.sets.sites.len())
        .into_par_iter()
        .map(|site| site_block(ctx, site))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn site_blocks(ctx: &ModelContext<'_>) -> Vec<Vec<Constraint>> {
    (0..ctx.sets.sites.len())
        .map(|site| site_block(ctx, site))
        .collect()
}
