use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{CommodityId, CommodityKind, PlanningData, SiteId, TechnologyId, Year};

use super::linear::VarId;

/// Index sets of the model. Positions into these vectors are the indices used everywhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSets {
    pub sites: Vec<SiteId>,
    pub technologies: Vec<TechnologyId>,
    pub fuels: Vec<CommodityId>,
    pub feedstocks: Vec<CommodityId>,
    /// Sorted ascending; `years[0]` is the baseline year
    pub years: Vec<Year>,
}

impl IndexSets {
    pub fn from_data(data: &PlanningData) -> Self {
        Self {
            sites: data.sites.iter().map(|s| s.id.clone()).collect(),
            technologies: data.technologies.iter().map(|t| t.id.clone()).collect(),
            fuels: data.fuels.iter().map(|c| c.id.clone()).collect(),
            feedstocks: data.feedstocks.iter().map(|c| c.id.clone()).collect(),
            years: data.horizon(),
        }
    }

    pub fn baseline_year(&self) -> Year {
        self.years.first().copied().unwrap_or_default()
    }

    pub fn commodities(&self, kind: CommodityKind) -> &[CommodityId] {
        match kind {
            CommodityKind::Fuel => &self.fuels,
            CommodityKind::Feedstock => &self.feedstocks,
        }
    }

    pub fn site_index(&self, id: &SiteId) -> Option<usize> {
        self.sites.iter().position(|s| s == id)
    }

    pub fn technology_index(&self, id: &TechnologyId) -> Option<usize> {
        self.technologies.iter().position(|t| t == id)
    }

    pub fn commodity_index(&self, kind: CommodityKind, id: &CommodityId) -> Option<usize> {
        self.commodities(kind).iter().position(|c| c == id)
    }

    pub fn year_index(&self, year: Year) -> Option<usize> {
        self.years.iter().position(|y| *y == year)
    }

    pub fn site_years(&self) -> impl Iterator<Item = SiteYear> {
        iproduct!(0..self.sites.len(), 0..self.years.len()).map(|(site, t)| SiteYear { site, t })
    }
}

// ============================================================================
// Composite keys (positions, `t` indexes `IndexSets::years`)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteYear {
    pub site: usize,
    pub t: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteTechYear {
    pub site: usize,
    pub tech: usize,
    pub t: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteCommodityYear {
    pub site: usize,
    pub commodity: usize,
    pub t: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteTechCommodityYear {
    pub site: usize,
    pub tech: usize,
    pub commodity: usize,
    pub t: usize,
}

/// Variables keyed by a composite index
#[derive(Debug, Clone, PartialEq)]
pub struct VarMap<K: Ord>(BTreeMap<K, VarId>);

impl<K: Ord + Copy> VarMap<K> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: K, var: VarId) {
        self.0.insert(key, var);
    }

    /// Every key is declared up front. An undeclared key panics in debug builds and
    /// otherwise yields `VarId(usize::MAX)`, which solver backends reject.
    pub fn at(&self, key: K) -> VarId {
        debug_assert!(self.0.contains_key(&key), "variable lookup for an undeclared key");
        self.0.get(&key).copied().unwrap_or(VarId(usize::MAX))
    }

    pub fn get(&self, key: K) -> Option<VarId> {
        self.0.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, VarId)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl<K: Ord + Copy> Default for VarMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Site, Technology};

    #[test]
    fn test_years_are_sorted_and_deduplicated() {
        let data = PlanningData {
            years: vec![2030, 2025, 2030, 2026],
            sites: vec![Site::new("S1", "T1", 2020, 1.0)],
            technologies: vec![Technology::new("T1", 10, 2000)],
            ..Default::default()
        };
        let sets = IndexSets::from_data(&data);
        assert_eq!(sets.years, vec![2025, 2026, 2030]);
        assert_eq!(sets.baseline_year(), 2025);
        assert_eq!(sets.year_index(2030), Some(2));
        assert_eq!(sets.site_years().count(), 3);
    }

    #[test]
    fn test_var_map_iterates_in_key_order() {
        let mut map = VarMap::new();
        map.insert(SiteYear { site: 1, t: 0 }, VarId(7));
        map.insert(SiteYear { site: 0, t: 1 }, VarId(3));
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![SiteYear { site: 0, t: 1 }, SiteYear { site: 1, t: 0 }]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "undeclared key")]
    fn test_var_map_rejects_undeclared_key() {
        let mut map = VarMap::new();
        map.insert(SiteYear { site: 0, t: 0 }, VarId(0));
        map.at(SiteYear { site: 0, t: 1 });
    }
}
