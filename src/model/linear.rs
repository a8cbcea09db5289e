use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Handle of a declared decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VarId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Binary,
    /// Continuous, bounded below by zero
    NonNegative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
}

/// Ordered list of variable declarations; `VarId(i)` is the i-th entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarRegistry {
    defs: Vec<VarDef>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: String, kind: VarKind) -> VarId {
        self.defs.push(VarDef { name, kind });
        VarId(self.defs.len() - 1)
    }

    pub fn get(&self, id: VarId) -> Option<&VarDef> {
        self.defs.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VarDef)> {
        self.defs.iter().enumerate().map(|(i, d)| (VarId(i), d))
    }

    pub fn binary_count(&self) -> usize {
        self.defs.iter().filter(|d| d.kind == VarKind::Binary).count()
    }
}

/// Affine expression `Σ coeff·var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, f64>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coeff: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(var, coeff);
        expr
    }

    /// Sum of `coeff·var` pairs
    pub fn sum(terms: impl IntoIterator<Item = (VarId, f64)>) -> Self {
        let mut expr = Self::new();
        for (var, coeff) in terms {
            expr.add_term(var, coeff);
        }
        expr
    }

    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        if coeff == 0.0 {
            return;
        }
        let entry = self.terms.entry(var).or_insert(0.0);
        *entry += coeff;
        if *entry == 0.0 {
            self.terms.remove(&var);
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|(v, c)| (*v, *c))
    }

    pub fn constant_part(&self) -> f64 {
        self.constant
    }

    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value under `values[var.0]`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::term(var, 1.0)
    }
}

impl From<f64> for LinearExpr {
    fn from(value: f64) -> Self {
        LinearExpr::constant(value)
    }
}

impl AddAssign for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        for (var, coeff) in rhs.terms {
            self.add_term(var, coeff);
        }
        self.constant += rhs.constant;
    }
}

impl SubAssign for LinearExpr {
    fn sub_assign(&mut self, rhs: LinearExpr) {
        *self += -rhs;
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(mut self) -> LinearExpr {
        for coeff in self.terms.values_mut() {
            *coeff = -*coeff;
        }
        self.constant = -self.constant;
        self
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        self += rhs.into();
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(mut self, rhs: T) -> LinearExpr {
        self -= rhs.into();
        self
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, rhs: f64) -> LinearExpr {
        if rhs == 0.0 {
            return LinearExpr::new();
        }
        for coeff in self.terms.values_mut() {
            *coeff *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<VarId> for f64 {
    type Output = LinearExpr;

    fn mul(self, rhs: VarId) -> LinearExpr {
        LinearExpr::term(rhs, self)
    }
}

impl std::iter::Sum for LinearExpr {
    fn sum<I: Iterator<Item = LinearExpr>>(iter: I) -> Self {
        iter.fold(LinearExpr::new(), |acc, e| acc + e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display)]
pub enum Sense {
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "=")]
    Eq,
}

/// Groups constraints by the rule that generated them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintFamily {
    BaselineFix,
    Exclusivity,
    ActiveDefinition,
    SingleActive,
    LifespanGating,
    IntroductionGating,
    AllowedActions,
    ActivationChange,
    NoSelfReplace,
    RenewCap,
    LateRestart,
    ProductionTarget,
    ProductionBalance,
    SelectionLink,
    SelectionCount,
    CommodityIntroduction,
    Reachability,
    Compatibility,
    ShareBounds,
    Linearization,
    EmissionAccounting,
    EmissionCap,
    SiteEmissionCap,
}

/// `Σ coeff·var  sense  rhs`, with constants moved to the right
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub family: ConstraintFamily,
    pub label: String,
    pub lhs: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(
        family: ConstraintFamily,
        label: impl Into<String>,
        lhs: impl Into<LinearExpr>,
        sense: Sense,
        rhs: impl Into<LinearExpr>,
    ) -> Self {
        let mut lhs = lhs.into() - rhs.into();
        let rhs = -lhs.constant;
        lhs.constant = 0.0;
        Self {
            family,
            label: label.into(),
            lhs,
            sense,
            rhs,
        }
    }

    pub fn le(
        family: ConstraintFamily,
        label: impl Into<String>,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
    ) -> Self {
        Self::new(family, label, lhs, Sense::Le, rhs)
    }

    pub fn ge(
        family: ConstraintFamily,
        label: impl Into<String>,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
    ) -> Self {
        Self::new(family, label, lhs, Sense::Ge, rhs)
    }

    pub fn eq(
        family: ConstraintFamily,
        label: impl Into<String>,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
    ) -> Self {
        Self::new(family, label, lhs, Sense::Eq, rhs)
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}
