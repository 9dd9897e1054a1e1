//! Diagnostic test models.

use crate::config::{ScreeningParameters, TestParameters};
use crate::draws::UniformDraw;
use crate::error::ScreeningError;
use crate::state::{
    CancerState, CervicalLesionState, HpvState, HpvStrain, ScreeningTestResult, StrainMap,
};

pub const COTEST_AGE_MIN: f64 = 30.0;
pub const COTEST_AGE_MAX: f64 = 65.0;

/// A true positive is reported positive when the draw falls under the sensitivity.
fn detects(params: &TestParameters, draws: &mut impl UniformDraw) -> bool {
    draws.uniform() < params.sensitivity
}

/// A true negative is misreported when the draw lands above the specificity.
fn false_alarm(params: &TestParameters, draws: &mut impl UniformDraw) -> bool {
    draws.uniform() > params.specificity
}

/// Visual inspection with acetic acid, read against the worst HPV state.
#[derive(Debug, Clone, Copy)]
pub struct ViaTest {
    params: TestParameters,
}

impl ViaTest {
    pub fn new(params: TestParameters) -> Self {
        ViaTest { params }
    }

    pub fn params(&self) -> &TestParameters {
        &self.params
    }

    pub fn result(
        &self,
        hpv: HpvState,
        cancer: CancerState,
        draws: &mut impl UniformDraw,
    ) -> Result<ScreeningTestResult, ScreeningError> {
        if cancer == CancerState::Dead {
            return Err(ScreeningError::NotScreenable(cancer));
        }
        let result = match (hpv, cancer) {
            (HpvState::Cancer, CancerState::Normal) => {
                return Err(ScreeningError::ContradictoryState { hpv, cancer });
            }
            (HpvState::Normal | HpvState::Hpv | HpvState::Cin1, _) => {
                if false_alarm(&self.params, draws) {
                    ScreeningTestResult::Positive
                } else {
                    ScreeningTestResult::Negative
                }
            }
            (HpvState::Cin23, _) => {
                if detects(&self.params, draws) {
                    ScreeningTestResult::Positive
                } else {
                    ScreeningTestResult::Negative
                }
            }
            (HpvState::Cancer, CancerState::Local) => {
                if detects(&self.params, draws) {
                    ScreeningTestResult::Cancer
                } else {
                    ScreeningTestResult::Negative
                }
            }
            // Regional and distant disease is visible regardless of accuracy.
            (HpvState::Cancer, _) => ScreeningTestResult::Cancer,
        };
        Ok(result)
    }
}

/// HPV DNA assay. One overall draw decides positivity; strain-level results
/// then follow deterministically from the true strain states.
#[derive(Debug, Clone, Copy)]
pub struct DnaTest {
    params: TestParameters,
}

impl DnaTest {
    pub fn new(params: TestParameters) -> Self {
        DnaTest { params }
    }

    pub fn params(&self) -> &TestParameters {
        &self.params
    }

    pub fn result(
        &self,
        strains: &StrainMap<HpvState>,
        draws: &mut impl UniformDraw,
    ) -> StrainMap<ScreeningTestResult> {
        let has_detectable = HpvStrain::DETECTABLE
            .iter()
            .any(|&s| strains[s] != HpvState::Normal);

        let (positive, false_positive) = if has_detectable {
            (detects(&self.params, draws), false)
        } else {
            let fp = false_alarm(&self.params, draws);
            (fp, fp)
        };

        let mut result = StrainMap::filled(ScreeningTestResult::Negative);
        if !positive {
            return result;
        }
        for strain in HpvStrain::DETECTABLE {
            if strains[strain] != HpvState::Normal {
                result[strain] = ScreeningTestResult::Positive;
            }
        }
        // The assay reports a high-risk signal on a false call.
        if false_positive {
            result[HpvStrain::HighRisk] = ScreeningTestResult::Positive;
        }
        result
    }
}

/// Pap smear, read against the cervical lesion grade.
#[derive(Debug, Clone, Copy)]
pub struct CytologyTest {
    params: TestParameters,
}

impl CytologyTest {
    pub fn new(params: TestParameters) -> Self {
        CytologyTest { params }
    }

    pub fn params(&self) -> &TestParameters {
        &self.params
    }

    pub fn result(
        &self,
        lesion: CervicalLesionState,
        draws: &mut impl UniformDraw,
    ) -> ScreeningTestResult {
        let positive = if lesion.is_abnormal() {
            detects(&self.params, draws)
        } else {
            false_alarm(&self.params, draws)
        };
        if positive { ScreeningTestResult::Positive } else { ScreeningTestResult::Negative }
    }
}

/// Composite co-test outcome plus the raw component results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CotestResult {
    pub cotest: ScreeningTestResult,
    pub cytology: ScreeningTestResult,
    pub hpv: StrainMap<ScreeningTestResult>,
    pub hpv_16_18: bool,
    pub hr_hpv: bool,
    pub lr_hpv: bool,
}

/// Cytology plus HPV DNA, only offered between ages 30 and 65.
#[derive(Debug, Clone, Copy)]
pub struct CoTest {
    params: TestParameters,
    cytology: CytologyTest,
    dna: DnaTest,
}

impl CoTest {
    pub fn new(params: TestParameters, cytology: CytologyTest, dna: DnaTest) -> Self {
        CoTest { params, cytology, dna }
    }

    pub fn params(&self) -> &TestParameters {
        &self.params
    }

    pub fn result(
        &self,
        age: f64,
        lesion: CervicalLesionState,
        strains: &StrainMap<HpvState>,
        draws: &mut impl UniformDraw,
    ) -> Result<CotestResult, ScreeningError> {
        if !(COTEST_AGE_MIN..=COTEST_AGE_MAX).contains(&age) {
            return Err(ScreeningError::AgeOutOfRange(age));
        }

        let cytology = self.cytology.result(lesion, draws);
        let hpv = self.dna.result(strains, draws);

        let true_positive = cytology == ScreeningTestResult::Positive
            || hpv.values().any(|r| *r == ScreeningTestResult::Positive);

        let cotest = if true_positive {
            if detects(&self.params, draws) {
                ScreeningTestResult::Positive
            } else {
                ScreeningTestResult::Negative
            }
        } else if draws.uniform() < self.params.specificity {
            ScreeningTestResult::Negative
        } else {
            ScreeningTestResult::Positive
        };

        Ok(CotestResult {
            cotest,
            cytology,
            hpv_16_18: hpv.is_positive(HpvStrain::Sixteen) || hpv.is_positive(HpvStrain::Eighteen),
            hr_hpv: hpv.is_positive(HpvStrain::HighRisk),
            lr_hpv: hpv.is_positive(HpvStrain::LowRisk),
            hpv,
        })
    }
}

/// Cancer inspection: detects regional and distant disease only.
#[derive(Debug, Clone, Copy)]
pub struct CancerInspectionTest {
    params: TestParameters,
}

impl CancerInspectionTest {
    pub fn new(params: TestParameters) -> Self {
        CancerInspectionTest { params }
    }

    pub fn params(&self) -> &TestParameters {
        &self.params
    }

    pub fn result(
        &self,
        cancer: CancerState,
        draws: &mut impl UniformDraw,
    ) -> Result<ScreeningTestResult, ScreeningError> {
        let found = match cancer {
            CancerState::Dead => return Err(ScreeningError::NotScreenable(cancer)),
            CancerState::Regional | CancerState::Distant => detects(&self.params, draws),
            CancerState::Normal | CancerState::Local => false_alarm(&self.params, draws),
        };
        Ok(if found { ScreeningTestResult::Cancer } else { ScreeningTestResult::Negative })
    }
}

/// The full set of test models configured from one parameter block.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticSuite {
    pub via: ViaTest,
    pub dna: DnaTest,
    pub cytology: CytologyTest,
    pub cotest: CoTest,
    pub cancer_inspection: CancerInspectionTest,
}

impl DiagnosticSuite {
    pub fn new(params: &ScreeningParameters) -> Self {
        let cytology = CytologyTest::new(params.cytology);
        let dna = DnaTest::new(params.dna);
        DiagnosticSuite {
            via: ViaTest::new(params.via),
            dna,
            cytology,
            cotest: CoTest::new(params.cotest, cytology, dna),
            cancer_inspection: CancerInspectionTest::new(params.cancer_inspection),
        }
    }
}
