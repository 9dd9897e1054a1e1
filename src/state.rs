use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Severity of one HPV strain's infection track. Ordered: the worst state
/// across strains is the agent's `max_hpv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HpvState {
    Normal,
    Hpv,
    #[strum(to_string = "CIN_1")]
    #[serde(rename = "CIN_1")]
    Cin1,
    #[strum(to_string = "CIN_2_3")]
    #[serde(rename = "CIN_2_3")]
    Cin23,
    Cancer,
}

/// Independently tracked HPV lineages, in their fixed enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HpvStrain {
    Sixteen = 0,
    Eighteen = 1,
    HighRisk = 2,
    LowRisk = 3,
}

impl HpvStrain {
    pub const ALL: [HpvStrain; 4] =
        [HpvStrain::Sixteen, HpvStrain::Eighteen, HpvStrain::HighRisk, HpvStrain::LowRisk];

    /// Strains an HPV DNA assay can report.
    pub const DETECTABLE: [HpvStrain; 3] =
        [HpvStrain::Sixteen, HpvStrain::Eighteen, HpvStrain::HighRisk];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancerState {
    Normal,
    Local,
    Regional,
    Distant,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancerDetectionState {
    Undetected,
    Detected,
}

/// Cytology-observable lesion grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CervicalLesionState {
    Normal,
    Ascus,
    Lsil,
    Asch,
    Hsil,
}

impl CervicalLesionState {
    pub fn is_abnormal(self) -> bool {
        self != CervicalLesionState::Normal
    }
}

/// Observed result of a diagnostic test. `Cancer` is stronger than `Positive`;
/// tests that look only at cancer status never report `Positive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningTestResult {
    Negative,
    Positive,
    Cancer,
}

/// Control state of an agent within a screening protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningState {
    Routine,
    ReTest,
    Surveillance,
    /// Only produced by the triage rules; no protocol moves an agent here.
    Colposcopy,
}

/// One value per HPV strain, indexed by [`HpvStrain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrainMap<T>([T; 4]);

impl<T: Copy> StrainMap<T> {
    pub fn filled(value: T) -> Self {
        StrainMap([value; 4])
    }
}

impl<T> StrainMap<T> {
    pub fn from_fn(f: impl FnMut(HpvStrain) -> T) -> Self {
        StrainMap(HpvStrain::ALL.map(f))
    }

    /// Iterate in the fixed strain order.
    pub fn iter(&self) -> impl Iterator<Item = (HpvStrain, &T)> {
        HpvStrain::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T> Index<HpvStrain> for StrainMap<T> {
    type Output = T;

    fn index(&self, strain: HpvStrain) -> &T {
        &self.0[strain.index()]
    }
}

impl<T> IndexMut<HpvStrain> for StrainMap<T> {
    fn index_mut(&mut self, strain: HpvStrain) -> &mut T {
        &mut self.0[strain.index()]
    }
}

impl StrainMap<HpvState> {
    /// Worst state across all strains.
    pub fn worst(&self) -> HpvState {
        self.values().copied().max().unwrap_or(HpvState::Normal)
    }
}

impl StrainMap<ScreeningTestResult> {
    pub fn all_negative(&self) -> bool {
        self.values().all(|r| *r == ScreeningTestResult::Negative)
    }

    pub fn is_positive(&self, strain: HpvStrain) -> bool {
        self[strain] == ScreeningTestResult::Positive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hpv_state_severity_is_ordered() {
        assert!(HpvState::Normal < HpvState::Hpv);
        assert!(HpvState::Hpv < HpvState::Cin1);
        assert!(HpvState::Cin1 < HpvState::Cin23);
        assert!(HpvState::Cin23 < HpvState::Cancer);
    }

    #[test]
    fn strain_map_iterates_in_fixed_order() {
        let map = StrainMap::from_fn(|s| s);
        let order: Vec<HpvStrain> = map.iter().map(|(s, _)| s).collect();
        assert_eq!(order, HpvStrain::ALL.to_vec());
        for (strain, value) in map.iter() {
            assert_eq!(strain, *value);
        }
    }

    #[test]
    fn worst_picks_most_severe_strain() {
        let mut map = StrainMap::filled(HpvState::Normal);
        assert_eq!(map.worst(), HpvState::Normal);
        map[HpvStrain::LowRisk] = HpvState::Cin1;
        map[HpvStrain::Eighteen] = HpvState::Hpv;
        assert_eq!(map.worst(), HpvState::Cin1);
    }

    #[test]
    fn display_uses_screaming_snake_case() {
        assert_eq!(HpvState::Cin23.to_string(), "CIN_2_3");
        assert_eq!(ScreeningState::ReTest.to_string(), "RE_TEST");
        assert_eq!(HpvStrain::HighRisk.to_string(), "HIGH_RISK");
    }
}
