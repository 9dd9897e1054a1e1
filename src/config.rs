use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScreeningError;
use crate::protocol::ProtocolKind;
use crate::triage::ScreeningTest;

/// Accuracy and unit cost of one diagnostic test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestParameters {
    /// Probability a true positive is reported positive.
    pub sensitivity: f64,
    /// Probability a true negative is reported negative.
    pub specificity: f64,
    pub cost: f64,
}

impl TestParameters {
    pub const fn new(sensitivity: f64, specificity: f64, cost: f64) -> Self {
        TestParameters { sensitivity, specificity, cost }
    }

    fn validate(&self, sensitivity: &'static str, specificity: &'static str, cost: &'static str) -> Result<(), ScreeningError> {
        check_probability(sensitivity, self.sensitivity)?;
        check_probability(specificity, self.specificity)?;
        check_non_negative(cost, self.cost)
    }
}

/// Fractions of the cohort who never attend a routine or a surveillance visit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplianceParameters {
    pub never: f64,
    pub never_surveillance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyParameters {
    pub test: ScreeningTest,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        StrategyParameters { test: ScreeningTest::Cotest }
    }
}

/// Everything the screening core reads: active protocol, eligibility window,
/// re-screen intervals (years), test accuracy and compliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreeningParameters {
    pub protocol: ProtocolKind,
    pub age_routine_start: f64,
    pub age_routine_end: f64,
    pub interval_routine: f64,
    pub interval_re_test: f64,
    pub interval_surveillance: f64,
    pub interval_hiv: f64,
    pub via: TestParameters,
    pub dna: TestParameters,
    pub cytology: TestParameters,
    pub cotest: TestParameters,
    pub cancer_inspection: TestParameters,
    pub compliance: ComplianceParameters,
    pub strategy: StrategyParameters,
}

impl Default for ScreeningParameters {
    fn default() -> Self {
        ScreeningParameters {
            protocol: ProtocolKind::None,
            age_routine_start: 25.0,
            age_routine_end: 49.0,
            interval_routine: 3.0,
            interval_re_test: 1.0,
            interval_surveillance: 1.0,
            interval_hiv: 3.0,
            via: TestParameters::new(0.73, 0.67, 2.52),
            dna: TestParameters::new(0.88, 0.60, 18.00),
            cytology: TestParameters::new(0.55, 0.97, 10.00), // uncalibrated
            cotest: TestParameters::new(0.95, 0.90, 28.00),   // uncalibrated
            cancer_inspection: TestParameters::new(1.00, 1.00, 2.52),
            compliance: ComplianceParameters::default(),
            strategy: StrategyParameters::default(),
        }
    }
}

impl ScreeningParameters {
    /// Parse from JSON layered over the defaults, then validate. Nested
    /// blocks merge key by key; unknown keys are rejected.
    pub fn from_json(text: &str) -> Result<Self, ScreeningError> {
        let params = overlay(&ScreeningParameters::default(), text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ScreeningError> {
        check_non_negative("age_routine_start", self.age_routine_start)?;
        if self.age_routine_end < self.age_routine_start {
            return Err(ScreeningError::InvalidParameter {
                name: "age_routine_end",
                value: self.age_routine_end,
            });
        }
        check_non_negative("interval_routine", self.interval_routine)?;
        check_non_negative("interval_re_test", self.interval_re_test)?;
        check_non_negative("interval_surveillance", self.interval_surveillance)?;
        check_non_negative("interval_hiv", self.interval_hiv)?;
        self.via.validate("via.sensitivity", "via.specificity", "via.cost")?;
        self.dna.validate("dna.sensitivity", "dna.specificity", "dna.cost")?;
        self.cytology.validate("cytology.sensitivity", "cytology.specificity", "cytology.cost")?;
        self.cotest.validate("cotest.sensitivity", "cotest.specificity", "cotest.cost")?;
        self.cancer_inspection.validate(
            "cancer_inspection.sensitivity",
            "cancer_inspection.specificity",
            "cancer_inspection.cost",
        )?;
        check_probability("compliance.never", self.compliance.never)?;
        check_probability("compliance.never_surveillance", self.compliance.never_surveillance)
    }
}

/// One CIN treatment method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CinTreatmentParameters {
    /// Probability the treatment clears every infected strain.
    pub effectiveness: f64,
    /// Share of treated women assigned this method.
    pub proportion: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreatmentParameters {
    pub leep: CinTreatmentParameters,
    pub cryo: CinTreatmentParameters,
}

impl Default for TreatmentParameters {
    fn default() -> Self {
        TreatmentParameters {
            leep: CinTreatmentParameters { effectiveness: 0.94, proportion: 0.15, cost: 32.00 },
            cryo: CinTreatmentParameters { effectiveness: 0.88, proportion: 0.85, cost: 1.52 },
        }
    }
}

impl TreatmentParameters {
    pub fn validate(&self) -> Result<(), ScreeningError> {
        check_probability("treatment.leep.effectiveness", self.leep.effectiveness)?;
        check_probability("treatment.leep.proportion", self.leep.proportion)?;
        check_non_negative("treatment.leep.cost", self.leep.cost)?;
        check_probability("treatment.cryo.effectiveness", self.cryo.effectiveness)?;
        check_probability("treatment.cryo.proportion", self.cryo.proportion)?;
        check_non_negative("treatment.cryo.cost", self.cryo.cost)?;
        let total = self.leep.proportion + self.cryo.proportion;
        if (total - 1.0).abs() > 1e-9 {
            return Err(ScreeningError::InvalidParameter { name: "treatment.proportion", value: total });
        }
        Ok(())
    }
}

/// Shape of the synthetic cohort the demo driver builds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CohortConfig {
    pub agents: usize,
    pub age_min: f64,
    pub age_max: f64,
    /// Per-strain probability of carrying an infection at the start.
    pub strain_prevalence: f64,
    /// Probability of a local cancer at the start.
    pub cancer_prevalence: f64,
    pub hiv_prevalence: f64,
}

impl Default for CohortConfig {
    fn default() -> Self {
        CohortConfig {
            agents: 10_000,
            age_min: 20.0,
            age_max: 45.0,
            strain_prevalence: 0.08,  // uncalibrated
            cancer_prevalence: 0.002, // uncalibrated
            hiv_prevalence: 0.05,     // uncalibrated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub seed: u64,
    pub years: u32,
    pub cohort: CohortConfig,
    pub screening: ScreeningParameters,
    pub treatment: TreatmentParameters,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig::canonical()
    }
}

impl SimulationConfig {
    pub fn canonical() -> Self {
        SimulationConfig {
            seed: 42,
            years: 20,
            cohort: CohortConfig::default(),
            screening: ScreeningParameters {
                protocol: ProtocolKind::DnaThenVia,
                ..ScreeningParameters::default()
            },
            treatment: TreatmentParameters::default(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ScreeningError> {
        let config = overlay(&SimulationConfig::canonical(), text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScreeningError> {
        self.screening.validate()?;
        self.treatment.validate()?;
        check_probability("cohort.strain_prevalence", self.cohort.strain_prevalence)?;
        check_probability("cohort.cancer_prevalence", self.cohort.cancer_prevalence)?;
        check_probability("cohort.hiv_prevalence", self.cohort.hiv_prevalence)?;
        if self.cohort.age_max < self.cohort.age_min {
            return Err(ScreeningError::InvalidParameter {
                name: "cohort.age_max",
                value: self.cohort.age_max,
            });
        }
        Ok(())
    }
}

/// Decode `text` on top of `defaults`, merging objects key by key.
fn overlay<T: Serialize + DeserializeOwned>(defaults: &T, text: &str) -> Result<T, ScreeningError> {
    let mut value = serde_json::to_value(defaults)?;
    merge(&mut value, serde_json::from_str(text)?);
    Ok(serde_json::from_value(value)?)
}

fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ScreeningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScreeningError::InvalidParameter { name, value })
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), ScreeningError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ScreeningError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let p = ScreeningParameters::default();
        assert_eq!(p.age_routine_start, 25.0);
        assert_eq!(p.age_routine_end, 49.0);
        assert_eq!(p.interval_routine, 3.0);
        assert_eq!(p.interval_re_test, 1.0);
        assert_eq!(p.interval_surveillance, 1.0);
        assert_eq!(p.interval_hiv, 3.0);
        assert_eq!(p.via.cost, 2.52);
        assert_eq!(p.dna.cost, 18.0);
        assert_eq!(p.cancer_inspection.cost, 2.52);
        assert_eq!(p.protocol, ProtocolKind::None);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let p = ScreeningParameters::from_json(
            r#"{"protocol":"dna_then_triage","via":{"sensitivity":0.5},"interval_hiv":2}"#,
        )
        .unwrap();
        assert_eq!(p.protocol, ProtocolKind::DnaThenTriage);
        assert_eq!(p.via.sensitivity, 0.5);
        assert_eq!(p.via.specificity, 0.67);
        assert_eq!(p.via.cost, 2.52);
        assert_eq!(p.dna, ScreeningParameters::default().dna);
        assert_eq!(p.interval_hiv, 2.0);
        assert_eq!(p.interval_routine, 3.0);
    }

    #[test]
    fn partial_treatment_block_keeps_other_fields() {
        let config = SimulationConfig::from_json(r#"{"treatment":{"leep":{"cost":40}}}"#).unwrap();
        let defaults = TreatmentParameters::default();
        assert_eq!(config.treatment.leep.cost, 40.0);
        assert_eq!(config.treatment.leep.effectiveness, defaults.leep.effectiveness);
        assert_eq!(config.treatment.leep.proportion, defaults.leep.proportion);
        assert_eq!(config.treatment.cryo, defaults.cryo);
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        for text in [
            r#"{"interval_rutine":10}"#,
            r#"{"via":{"sensitivty":0.5}}"#,
            r#"{"compliance":{"nevr":0.2}}"#,
        ] {
            let err = ScreeningParameters::from_json(text).unwrap_err();
            assert!(matches!(err, ScreeningError::Parameters(_)), "{text}: got {err:?}");
        }
        let err = SimulationConfig::from_json(r#"{"treatment":{"cryo":{"cots":1}}}"#).unwrap_err();
        assert!(matches!(err, ScreeningError::Parameters(_)), "got {err:?}");
    }

    #[test]
    fn treatment_proportions_must_sum_to_one() {
        assert!(TreatmentParameters::default().validate().is_ok());
        let mut treatment = TreatmentParameters::default();
        treatment.cryo.proportion = 0.15;
        assert!(matches!(
            treatment.validate(),
            Err(ScreeningError::InvalidParameter { name: "treatment.proportion", .. })
        ));
        let err = SimulationConfig::from_json(r#"{"treatment":{"leep":{"proportion":0.5}}}"#)
            .unwrap_err();
        assert!(
            matches!(err, ScreeningError::InvalidParameter { name: "treatment.proportion", .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let err = ScreeningParameters::from_json(r#"{"dna":{"sensitivity":1.2}}"#).unwrap_err();
        assert!(
            matches!(err, ScreeningError::InvalidParameter { name: "dna.sensitivity", .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn inverted_age_window_is_rejected() {
        let p = ScreeningParameters {
            age_routine_start: 50.0,
            age_routine_end: 30.0,
            ..ScreeningParameters::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ScreeningError::InvalidParameter { name: "age_routine_end", .. })
        ));
    }

    #[test]
    fn unknown_protocol_name_fails_to_parse() {
        let err = ScreeningParameters::from_json(r#"{"protocol":"pap_smear"}"#).unwrap_err();
        assert!(matches!(err, ScreeningError::Parameters(_)), "got {err:?}");
    }

    #[test]
    fn canonical_simulation_config_is_valid() {
        let config = SimulationConfig::canonical();
        assert!(config.validate().is_ok());
        assert_eq!(config.screening.protocol, ProtocolKind::DnaThenVia);
    }

    #[test]
    fn simulation_config_round_trips_through_json() {
        let config = SimulationConfig::canonical();
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(SimulationConfig::from_json(&text).unwrap(), config);
    }
}
