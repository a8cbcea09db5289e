use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Calendar year of the planning horizon
pub type Year = u32;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Production site (a furnace line, a plant)
    SiteId
);
string_id!(
    /// Process route
    TechnologyId
);
string_id!(
    /// Fuel or feedstock
    CommodityId
);

/// Which consumable pool a commodity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CommodityKind {
    Fuel,
    Feedstock,
}

// ============================================================================
// Year-indexed tables
// ============================================================================

/// Value per year. Lookups never fail; callers pick the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearTable(pub BTreeMap<Year, f64>);

impl YearTable {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Same value for every year in `years`
    pub fn flat(years: impl IntoIterator<Item = Year>, value: f64) -> Self {
        Self(years.into_iter().map(|y| (y, value)).collect())
    }

    pub fn with(mut self, year: Year, value: f64) -> Self {
        self.0.insert(year, value);
        self
    }

    pub fn get(&self, year: Year) -> Option<f64> {
        self.0.get(&year).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Year, f64)> + '_ {
        self.0.iter().map(|(y, v)| (*y, *v))
    }
}

impl FromIterator<(Year, f64)> for YearTable {
    fn from_iter<I: IntoIterator<Item = (Year, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_table_lookup() {
        let table = YearTable::flat(2025..=2027, 3.5).with(2026, 4.0);
        assert_eq!(table.get(2025), Some(3.5));
        assert_eq!(table.get(2026), Some(4.0));
        assert_eq!(table.get(2030), None);
    }

    #[test]
    fn test_year_table_deserializes_string_keys() {
        let table: YearTable = serde_json::from_str(r#"{"2025": 1.5, "2030": 2.0}"#).unwrap();
        assert_eq!(table.get(2030), Some(2.0));
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(SiteId::new("blast-1").to_string(), "blast-1");
        assert_eq!(CommodityKind::Feedstock.to_string(), "feedstock");
    }
}
