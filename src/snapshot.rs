use crate::state::{
    CancerDetectionState, CancerState, CervicalLesionState, HpvState, StrainMap,
};

/// Read-only view of one agent's hidden disease state at the moment of a
/// screening encounter. Produced by the cohort; the screening core never
/// writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiseaseSnapshot {
    pub hpv_strains: StrainMap<HpvState>,
    pub max_hpv: HpvState,
    pub cervical_lesion: CervicalLesionState,
    pub cancer: CancerState,
    pub cancer_detection: CancerDetectionState,
    pub hiv_detected: bool,
}

impl DiseaseSnapshot {
    /// Build a snapshot whose `max_hpv` is derived from the strain states.
    pub fn new(
        hpv_strains: StrainMap<HpvState>,
        cervical_lesion: CervicalLesionState,
        cancer: CancerState,
        cancer_detection: CancerDetectionState,
        hiv_detected: bool,
    ) -> Self {
        DiseaseSnapshot {
            max_hpv: hpv_strains.worst(),
            hpv_strains,
            cervical_lesion,
            cancer,
            cancer_detection,
            hiv_detected,
        }
    }

    pub fn cancer_detected(&self) -> bool {
        self.cancer_detection == CancerDetectionState::Detected
    }
}

impl Default for DiseaseSnapshot {
    fn default() -> Self {
        DiseaseSnapshot::new(
            StrainMap::filled(HpvState::Normal),
            CervicalLesionState::Normal,
            CancerState::Normal,
            CancerDetectionState::Undetected,
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HpvStrain;

    #[test]
    fn max_hpv_tracks_worst_strain() {
        let mut strains = StrainMap::filled(HpvState::Normal);
        strains[HpvStrain::Sixteen] = HpvState::Cin23;
        let snap = DiseaseSnapshot::new(
            strains,
            CervicalLesionState::Hsil,
            CancerState::Normal,
            CancerDetectionState::Undetected,
            false,
        );
        assert_eq!(snap.max_hpv, HpvState::Cin23);
        assert!(!snap.cancer_detected());
    }
}
