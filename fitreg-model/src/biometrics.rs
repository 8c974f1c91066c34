use std::{fmt, str::FromStr};

use num_derive::FromPrimitive;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BiometricError {
    #[error("invalid {field}: {value}")]
    InvalidInput { field: &'static str, value: f64 },
    #[error("unsupported sex category \"{0}\"")]
    UnsupportedCategory(String),
}

pub type Result<T> = std::result::Result<T, BiometricError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = BiometricError;

    fn from_str(s: &str) -> Result<Self> {
        let category = s.trim();
        if category.eq_ignore_ascii_case("male") {
            Ok(Sex::Male)
        } else if category.eq_ignore_ascii_case("female") {
            Ok(Sex::Female)
        } else {
            Err(BiometricError::UnsupportedCategory(category.to_owned()))
        }
    }
}

/// Raw anthropometric measurements. Both quantities are guaranteed to be
/// finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiometricInput {
    weight_kg: f64,
    height_cm: f64,
    sex: Sex,
}

impl BiometricInput {
    pub fn new(weight_kg: f64, height_cm: f64, sex: Sex) -> Result<Self> {
        Ok(Self {
            weight_kg: positive("weight", weight_kg)?,
            height_cm: positive("height", height_cm)?,
            sex,
        })
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BiometricResult {
    pub body_mass_index: f64,
    pub lean_body_mass: f64,
    pub lean_body_mass_percentage: f64,
}

impl BiometricResult {
    /// Reassembles a result from previously computed values, e.g. when
    /// loading it back from storage.
    pub fn from_parts(
        body_mass_index: f64,
        lean_body_mass: f64,
        lean_body_mass_percentage: f64,
    ) -> Self {
        Self {
            body_mass_index,
            lean_body_mass,
            lean_body_mass_percentage,
        }
    }
}

impl fmt::Display for BiometricResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BMI {:.2}, lean mass {:.3} kg ({:.2}%)",
            self.body_mass_index, self.lean_body_mass, self.lean_body_mass_percentage
        )
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(BiometricError::InvalidInput { field, value })
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> Result<f64> {
    let weight_kg = positive("weight", weight_kg)?;
    let height_m = positive("height", height_cm)? / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

/// Boer/James style regression, keyed on sex.
pub fn lean_body_mass(weight_kg: f64, height_cm: f64, sex: Sex) -> Result<f64> {
    let weight_kg = positive("weight", weight_kg)?;
    let height_cm = positive("height", height_cm)?;
    Ok(match sex {
        Sex::Male => 0.407 * weight_kg + 0.267 * height_cm - 19.2,
        Sex::Female => 0.252 * weight_kg + 0.473 * height_cm - 48.3,
    })
}

/// Not clamped: implausible inputs can yield values outside 0..=100.
pub fn lean_body_mass_percentage(lean_body_mass: f64, weight_kg: f64) -> Result<f64> {
    let weight_kg = positive("weight", weight_kg)?;
    Ok(round2(lean_body_mass / weight_kg * 100.0))
}

pub fn evaluate(input: &BiometricInput) -> Result<BiometricResult> {
    let body_mass_index = body_mass_index(input.weight_kg, input.height_cm)?;
    let lean_body_mass = lean_body_mass(input.weight_kg, input.height_cm, input.sex)?;
    let lean_body_mass_percentage = lean_body_mass_percentage(lean_body_mass, input.weight_kg)?;

    Ok(BiometricResult {
        body_mass_index,
        lean_body_mass,
        lean_body_mass_percentage,
    })
}

/// Validates untyped request values and evaluates them in one go.
pub fn evaluate_raw(weight_kg: f64, height_cm: f64, sex: &str) -> Result<BiometricResult> {
    let input = BiometricInput::new(weight_kg, height_cm, sex.parse()?)?;
    evaluate(&input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn evaluates_male_reference_case() {
        let input = BiometricInput::new(70.0, 175.0, Sex::Male).unwrap();
        let result = evaluate(&input).unwrap();

        assert_eq!(round2(result.body_mass_index), 22.86);
        assert_close(result.lean_body_mass, 56.015);
        assert_eq!(result.lean_body_mass_percentage, 80.02);
    }

    #[test]
    fn evaluates_female_reference_case() {
        let input = BiometricInput::new(60.0, 165.0, Sex::Female).unwrap();
        let result = evaluate(&input).unwrap();

        assert_eq!(round2(result.body_mass_index), 22.04);
        assert_close(result.lean_body_mass, 44.865);
        assert_eq!(result.lean_body_mass_percentage, 74.78);
    }

    #[test]
    fn body_mass_index_keeps_full_precision() {
        let bmi = body_mass_index(70.0, 175.0).unwrap();
        assert_close(bmi, 70.0 / (1.75 * 1.75));
        assert_ne!(bmi, round2(bmi));
    }

    #[test]
    fn body_mass_index_is_monotonic() {
        let weights = [40.0, 55.5, 70.0, 92.3, 140.0];
        let heights = [120.0, 150.0, 165.5, 180.0, 210.0];

        for height in heights {
            for pair in weights.windows(2) {
                assert!(
                    body_mass_index(pair[0], height).unwrap()
                        < body_mass_index(pair[1], height).unwrap()
                );
            }
        }
        for weight in weights {
            for pair in heights.windows(2) {
                assert!(
                    body_mass_index(weight, pair[0]).unwrap()
                        > body_mass_index(weight, pair[1]).unwrap()
                );
            }
        }
    }

    #[test]
    fn evaluate_is_deterministic() {
        let input = BiometricInput::new(81.4, 183.2, Sex::Female).unwrap();
        assert_eq!(evaluate(&input).unwrap(), evaluate(&input).unwrap());
    }

    #[test]
    fn rejects_non_positive_measurements() {
        let test_data = [
            (0.0, 175.0, "weight"),
            (70.0, 0.0, "height"),
            (-1.0, 175.0, "weight"),
            (70.0, -175.0, "height"),
            (f64::NAN, 175.0, "weight"),
            (70.0, f64::INFINITY, "height"),
        ];

        for (i, (weight, height, expected_field)) in test_data.into_iter().enumerate() {
            match body_mass_index(weight, height) {
                Err(BiometricError::InvalidInput { field, .. }) => {
                    assert_eq!(field, expected_field, "Test case #{}", i)
                }
                other => panic!("Test case #{}: unexpected {:?}", i, other),
            }
            assert!(
                BiometricInput::new(weight, height, Sex::Male).is_err(),
                "Test case #{}",
                i
            );
        }
    }

    #[test]
    fn lean_body_mass_percentage_requires_weight() {
        assert!(matches!(
            lean_body_mass_percentage(50.0, 0.0),
            Err(BiometricError::InvalidInput { field: "weight", .. })
        ));
    }

    #[test]
    fn lean_body_mass_percentage_is_not_clamped() {
        // A very tall, very light subject pushes the regression past 100%.
        let lbm = lean_body_mass(30.0, 220.0, Sex::Female).unwrap();
        assert!(lean_body_mass_percentage(lbm, 30.0).unwrap() > 100.0);
    }

    #[test]
    fn parses_sex_categories() {
        assert_eq!("male".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!(" Female ".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("MALE".parse::<Sex>().unwrap(), Sex::Male);
    }

    #[test]
    fn rejects_unsupported_categories() {
        for category in ["other", "", "m", "Masculino"] {
            assert_eq!(
                category.parse::<Sex>(),
                Err(BiometricError::UnsupportedCategory(category.to_owned()))
            );
        }
    }

    #[test]
    fn evaluate_raw_distinguishes_errors() {
        assert!(matches!(
            evaluate_raw(70.0, 175.0, "other"),
            Err(BiometricError::UnsupportedCategory(_))
        ));
        assert!(matches!(
            evaluate_raw(0.0, 175.0, "male"),
            Err(BiometricError::InvalidInput { .. })
        ));
        assert_eq!(
            evaluate_raw(70.0, 175.0, "male").unwrap(),
            evaluate(&BiometricInput::new(70.0, 175.0, Sex::Male).unwrap()).unwrap()
        );
    }

    #[test]
    fn sex_converts_from_stored_discriminant() {
        let male: Option<Sex> = num::FromPrimitive::from_i64(Sex::Male as i64);
        let female: Option<Sex> = num::FromPrimitive::from_i64(Sex::Female as i64);
        let invalid: Option<Sex> = num::FromPrimitive::from_i64(7);

        assert_eq!(male, Some(Sex::Male));
        assert_eq!(female, Some(Sex::Female));
        assert_eq!(invalid, None);
    }

    #[test]
    fn displays_rounded_values() {
        let result = BiometricResult::from_parts(22.857142857, 56.015, 80.02);
        assert_eq!(
            result.to_string(),
            "BMI 22.86, lean mass 56.015 kg (80.02%)"
        );
    }
}
