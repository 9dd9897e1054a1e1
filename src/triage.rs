use serde::{Deserialize, Serialize};
use strum::Display;

use crate::cohort::Cohort;
use crate::config::ScreeningParameters;
use crate::diagnostics::{COTEST_AGE_MAX, COTEST_AGE_MIN, CotestResult, CytologyTest, CoTest, DnaTest};
use crate::draws::UniformDraw;
use crate::error::ScreeningError;
use crate::state::{CervicalLesionState, HpvStrain, ScreeningState, ScreeningTestResult, StrainMap};
use crate::types::AgentId;

/// Pure decision table. Combinations it does not list resolve to RE_TEST.
pub fn triage_cytology(lesion: CervicalLesionState, result: ScreeningTestResult) -> ScreeningState {
    if result == ScreeningTestResult::Negative {
        return ScreeningState::Routine;
    }
    match lesion {
        CervicalLesionState::Ascus => ScreeningState::ReTest,
        CervicalLesionState::Lsil | CervicalLesionState::Asch | CervicalLesionState::Hsil => {
            ScreeningState::Colposcopy
        }
        CervicalLesionState::Normal => ScreeningState::ReTest,
    }
}

pub fn triage_dna(results: &StrainMap<ScreeningTestResult>) -> ScreeningState {
    if results.all_negative() {
        ScreeningState::Routine
    } else if results.is_positive(HpvStrain::Sixteen) || results.is_positive(HpvStrain::Eighteen) {
        ScreeningState::Colposcopy
    } else {
        ScreeningState::ReTest
    }
}

pub fn triage_cotest(
    cotest: ScreeningTestResult,
    cytology: ScreeningTestResult,
    hr_hpv: bool,
    hpv_16_18: bool,
    lesion: CervicalLesionState,
) -> ScreeningState {
    use ScreeningTestResult::{Negative, Positive};

    if cotest == Negative {
        return ScreeningState::Routine;
    }
    match (hr_hpv, cytology) {
        (true, Negative) if hpv_16_18 => ScreeningState::Colposcopy,
        (true, Negative) => ScreeningState::ReTest,
        (true, Positive) => ScreeningState::Colposcopy,
        (false, Positive) => match lesion {
            CervicalLesionState::Asch | CervicalLesionState::Lsil | CervicalLesionState::Hsil => {
                ScreeningState::Colposcopy
            }
            _ => ScreeningState::ReTest,
        },
        _ => ScreeningState::ReTest,
    }
}

/// Primary test offered by a [`ScreeningStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScreeningTest {
    Cytology,
    Hpv,
    Cotest,
}

/// Raw results of whichever test a strategy ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResults {
    Cytology(ScreeningTestResult),
    Hpv(StrainMap<ScreeningTestResult>),
    Cotest(CotestResult),
}

/// Age-driven test selection feeding the triage rules. Not wired to any
/// protocol: it reads the cohort and draws, but never writes agent state.
#[derive(Debug, Clone, Copy)]
pub struct ScreeningStrategy {
    test: ScreeningTest,
    cytology: CytologyTest,
    dna: DnaTest,
    cotest: CoTest,
}

impl ScreeningStrategy {
    pub fn new(params: &ScreeningParameters) -> Self {
        let cytology = CytologyTest::new(params.cytology);
        let dna = DnaTest::new(params.dna);
        ScreeningStrategy {
            test: params.strategy.test,
            cytology,
            dna,
            cotest: CoTest::new(params.cotest, cytology, dna),
        }
    }

    /// The test actually run at `age`; co-testing outside its age band
    /// falls back to cytology.
    pub fn test_for_age(&self, age: f64) -> ScreeningTest {
        match self.test {
            ScreeningTest::Cotest if !(COTEST_AGE_MIN..=COTEST_AGE_MAX).contains(&age) => {
                ScreeningTest::Cytology
            }
            test => test,
        }
    }

    pub fn perform_screening<C: Cohort + ?Sized>(
        &self,
        cohort: &C,
        agent: AgentId,
        draws: &mut impl UniformDraw,
    ) -> Result<TestResults, ScreeningError> {
        let age = cohort.age(agent);
        let snapshot = cohort.snapshot(agent);
        let results = match self.test_for_age(age) {
            ScreeningTest::Cytology => {
                TestResults::Cytology(self.cytology.result(snapshot.cervical_lesion, draws))
            }
            ScreeningTest::Hpv => TestResults::Hpv(self.dna.result(&snapshot.hpv_strains, draws)),
            ScreeningTest::Cotest => TestResults::Cotest(self.cotest.result(
                age,
                snapshot.cervical_lesion,
                &snapshot.hpv_strains,
                draws,
            )?),
        };
        Ok(results)
    }

    /// Dispatch `results` to the matching triage rule.
    pub fn triage(&self, results: &TestResults, lesion: CervicalLesionState) -> ScreeningState {
        match results {
            TestResults::Cytology(result) => triage_cytology(lesion, *result),
            TestResults::Hpv(strains) => triage_dna(strains),
            TestResults::Cotest(r) => triage_cotest(r.cotest, r.cytology, r.hr_hpv, r.hpv_16_18, lesion),
        }
    }
}
