//! Grading: grade values, grading services, grading details and the
//! abbreviation engine.
//!
//! A graded card carries an overall grade plus four sub-grades. The
//! abbreviation summarises how the sub-grades relate to the overall grade:
//!
//! - base `Q` ("quad") unless any sub-grade is below the overall grade, then `B`
//! - one `+` per sub-grade above the overall grade

use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cardboard_core::{DomainError, DomainResult, Entity};

use crate::ids::GradingDetailsId;
use crate::payload::{Field, JsonFields};

/// Maximum length of a grading serial number.
pub const SERIAL_NUMBER_MAX_LEN: usize = 12;

/// A grade between 0.0 and 10.0 with at most one fractional digit.
///
/// Always stored at scale 1, so `9` and `9.0` are the same grade and display as `9.0`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Grade(Decimal);

impl Grade {
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.normalize().scale() > 1 {
            return Err(DomainError::validation(
                "grade",
                "Ensure that there are no more than 1 decimal places.",
            ));
        }
        if value < Decimal::ZERO || value > Decimal::TEN {
            return Err(DomainError::validation(
                "grade",
                "Ensure this value is between 0.0 and 10.0.",
            ));
        }
        let mut scaled = value;
        scaled.rescale(1);
        Ok(Self(scaled))
    }

    /// Build from tenths, e.g. `Grade::from_tenths(95)` is 9.5.
    pub fn from_tenths(tenths: u8) -> DomainResult<Self> {
        Self::new(Decimal::new(i64::from(tenths), 1))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Grade {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Grade> for Decimal {
    fn from(value: Grade) -> Self {
        value.0
    }
}

impl FromStr for Grade {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| DomainError::validation("grade", "A valid number is required."))?;
        Self::new(value)
    }
}

impl core::fmt::Display for Grade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Compute the grade abbreviation from the overall grade and the four sub-grades.
///
/// Sub-grades are visited in the order centering, corners, edges, surface. Once
/// the base becomes `B` it stays `B`.
pub fn compute_abbreviation(
    overall: Grade,
    centering: Grade,
    corners: Grade,
    edges: Grade,
    surface: Grade,
) -> String {
    abbreviate(overall, [Some(centering), Some(corners), Some(edges), Some(surface)])
}

/// Missing sub-grades take no part in the comparison.
fn abbreviate(overall: Grade, subgrades: [Option<Grade>; 4]) -> String {
    let mut base = 'Q';
    let mut modifier = String::new();
    for sub in subgrades.into_iter().flatten() {
        if sub < overall {
            base = 'B';
        }
        if sub > overall {
            modifier.push('+');
        }
    }
    format!("{base}{modifier}")
}

/// Authentication/grading service that issued a grade.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradingService {
    #[serde(rename = "BGS")]
    BeckettGrading,
    #[serde(rename = "BAS")]
    BeckettAuthentication,
    #[serde(rename = "PSA")]
    ProfessionalSportsAuthentication,
}

impl GradingService {
    pub const ALL: [GradingService; 3] = [
        GradingService::BeckettGrading,
        GradingService::BeckettAuthentication,
        GradingService::ProfessionalSportsAuthentication,
    ];

    pub fn code(self) -> &'static str {
        match self {
            GradingService::BeckettGrading => "BGS",
            GradingService::BeckettAuthentication => "BAS",
            GradingService::ProfessionalSportsAuthentication => "PSA",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GradingService::BeckettGrading => "Beckett Grading Services",
            GradingService::BeckettAuthentication => "Beckett Authentication Services",
            GradingService::ProfessionalSportsAuthentication => {
                "Professional Sports Authentication"
            }
        }
    }
}

impl FromStr for GradingService {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradingService::ALL
            .into_iter()
            .find(|g| g.code() == s)
            .ok_or_else(|| {
                DomainError::validation("grading_service", crate::choices::invalid_choice(s))
            })
    }
}

impl core::fmt::Display for GradingService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Validated input for attaching grading details to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingPayload {
    pub grading_service: GradingService,
    pub serial_number: String,
    pub overall_grade: Option<Grade>,
    pub autograph_grade: Option<Grade>,
    pub centering_grade: Option<Grade>,
    pub corners_grade: Option<Grade>,
    pub edges_grade: Option<Grade>,
    pub surface_grade: Option<Grade>,
}

impl GradingPayload {
    /// Parse a JSON payload, reporting every invalid field at once.
    pub fn from_json(value: &Value) -> DomainResult<Self> {
        let mut fields = JsonFields::parse(value)?;
        fields.require("grading_service");
        fields.require("serial_number");

        let grading_service = fields.choice::<GradingService>("grading_service");
        let serial_number = match fields.string("serial_number", SERIAL_NUMBER_MAX_LEN, false) {
            Field::Set(s) if s.trim().is_empty() => {
                fields.error("serial_number", "This field may not be blank.");
                None
            }
            Field::Set(s) => Some(s),
            _ => None,
        };
        let overall_grade = fields.grade("overall_grade").into_option().flatten();
        let autograph_grade = fields.grade("autograph_grade").into_option().flatten();
        let centering_grade = fields.grade("centering_grade").into_option().flatten();
        let corners_grade = fields.grade("corners_grade").into_option().flatten();
        let edges_grade = fields.grade("edges_grade").into_option().flatten();
        let surface_grade = fields.grade("surface_grade").into_option().flatten();

        fields.finish()?;

        match (grading_service, serial_number) {
            (Some(grading_service), Some(serial_number)) => Ok(Self {
                grading_service,
                serial_number,
                overall_grade,
                autograph_grade,
                centering_grade,
                corners_grade,
                edges_grade,
                surface_grade,
            }),
            // finish() already failed for any missing required field
            _ => Err(DomainError::invariant("grading payload incomplete")),
        }
    }
}

/// Grading record attached to exactly one graded inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingDetails {
    pub id: GradingDetailsId,
    pub grading_service: GradingService,
    pub serial_number: String,
    pub overall_grade: Option<Grade>,
    pub autograph_grade: Option<Grade>,
    pub centering_grade: Option<Grade>,
    pub corners_grade: Option<Grade>,
    pub edges_grade: Option<Grade>,
    pub surface_grade: Option<Grade>,
    pub created_at: DateTime<Utc>,
}

impl GradingDetails {
    pub fn from_payload(id: GradingDetailsId, payload: GradingPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            grading_service: payload.grading_service,
            serial_number: payload.serial_number,
            overall_grade: payload.overall_grade,
            autograph_grade: payload.autograph_grade,
            centering_grade: payload.centering_grade,
            corners_grade: payload.corners_grade,
            edges_grade: payload.edges_grade,
            surface_grade: payload.surface_grade,
            created_at: now,
        }
    }

    /// Abbreviation such as `B` or `Q++`; `None` without an overall grade.
    pub fn abbreviation(&self) -> Option<String> {
        let overall = self.overall_grade?;
        Some(abbreviate(
            overall,
            [
                self.centering_grade,
                self.corners_grade,
                self.edges_grade,
                self.surface_grade,
            ],
        ))
    }

    /// Overall grade followed by the abbreviation, e.g. `9.5 B`.
    pub fn grade_label(&self) -> Option<String> {
        let overall = self.overall_grade?;
        let abbreviation = self.abbreviation()?;
        Some(format!("{overall} {abbreviation}"))
    }
}

impl Entity for GradingDetails {
    type Id = GradingDetailsId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn g(s: &str) -> Grade {
        s.parse().unwrap()
    }

    #[test]
    fn one_subgrade_below_overall_is_b() {
        assert_eq!(compute_abbreviation(g("9.5"), g("9.5"), g("9"), g("9.5"), g("9.5")), "B");
    }

    #[test]
    fn equal_subgrades_are_quad() {
        assert_eq!(compute_abbreviation(g("9.5"), g("9.5"), g("9.5"), g("9.5"), g("9.5")), "Q");
    }

    #[test]
    fn modifier_accumulates_per_higher_subgrade() {
        let overall = g("9.5");
        assert_eq!(compute_abbreviation(overall, g("9.5"), g("9.5"), g("9.5"), g("10")), "Q+");
        assert_eq!(compute_abbreviation(overall, g("9.5"), g("9.5"), g("10"), g("10")), "Q++");
        assert_eq!(compute_abbreviation(overall, g("10"), g("9.5"), g("10"), g("10")), "Q+++");
        assert_eq!(compute_abbreviation(overall, g("10"), g("10"), g("10"), g("10")), "Q++++");
    }

    #[test]
    fn raising_overall_to_ten_leaves_only_the_low_corner() {
        assert_eq!(compute_abbreviation(g("10"), g("10"), g("9"), g("10"), g("10")), "B");
    }

    #[test]
    fn base_b_keeps_modifiers() {
        assert_eq!(compute_abbreviation(g("9"), g("8.5"), g("9.5"), g("9"), g("10")), "B++");
    }

    #[test]
    fn grades_are_scaled_to_one_digit() {
        assert_eq!(g("9").to_string(), "9.0");
        assert_eq!(g("9.50").to_string(), "9.5");
        assert_eq!(Grade::from_tenths(85).unwrap(), g("8.5"));
    }

    #[test]
    fn grades_reject_bad_format() {
        assert!("9.25".parse::<Grade>().is_err());
        assert!("10.5".parse::<Grade>().is_err());
        assert!("-1".parse::<Grade>().is_err());
        assert!("nine".parse::<Grade>().is_err());
    }

    #[test]
    fn missing_subgrades_are_skipped() {
        let details = GradingDetails {
            id: GradingDetailsId::generate(),
            grading_service: GradingService::BeckettGrading,
            serial_number: "0012345678".to_string(),
            overall_grade: Some(g("9.5")),
            autograph_grade: None,
            centering_grade: Some(g("10")),
            corners_grade: None,
            edges_grade: None,
            surface_grade: Some(g("9")),
            created_at: Utc::now(),
        };
        assert_eq!(details.abbreviation().as_deref(), Some("B+"));
        assert_eq!(details.grade_label().as_deref(), Some("9.5 B+"));

        let ungraded = GradingDetails {
            overall_grade: None,
            ..details
        };
        assert_eq!(ungraded.abbreviation(), None);
        assert_eq!(ungraded.grade_label(), None);
    }

    #[test]
    fn payload_parses_strings_and_numbers() {
        let payload = GradingPayload::from_json(&json!({
            "grading_service": "BGS",
            "serial_number": "0012345678",
            "overall_grade": "9.5",
            "centering_grade": 9.5,
            "corners_grade": 9,
            "edges_grade": "9.5",
            "surface_grade": null,
        }))
        .unwrap();

        assert_eq!(payload.grading_service, GradingService::BeckettGrading);
        assert_eq!(payload.overall_grade, Some(g("9.5")));
        assert_eq!(payload.corners_grade, Some(g("9.0")));
        assert_eq!(payload.surface_grade, None);
        assert_eq!(payload.autograph_grade, None);
    }

    #[test]
    fn payload_reports_every_bad_field() {
        let err = GradingPayload::from_json(&json!({
            "grading_service": "CGC",
            "overall_grade": "9.55",
            "edges_grade": true,
        }))
        .unwrap_err();

        match err {
            DomainError::Validation(errors) => {
                assert!(errors.contains("grading_service"));
                assert!(errors.contains("serial_number"));
                assert!(errors.contains("overall_grade"));
                assert!(errors.contains("edges_grade"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn grading_service_labels() {
        assert_eq!(GradingService::ProfessionalSportsAuthentication.code(), "PSA");
        assert_eq!(
            GradingService::BeckettAuthentication.label(),
            "Beckett Authentication Services"
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn grade() -> impl Strategy<Value = Grade> {
            (0u8..=100).prop_map(|t| Grade::from_tenths(t).unwrap())
        }

        proptest! {
            /// Property: the abbreviation is a pure function of its inputs.
            #[test]
            fn abbreviation_is_deterministic(
                overall in grade(), a in grade(), b in grade(), c in grade(), d in grade()
            ) {
                let first = compute_abbreviation(overall, a, b, c, d);
                let second = compute_abbreviation(overall, a, b, c, d);
                prop_assert_eq!(first, second);
            }

            /// Property: one `+` per sub-grade above overall; base `B` iff any is below.
            #[test]
            fn abbreviation_matches_counts(
                overall in grade(), a in grade(), b in grade(), c in grade(), d in grade()
            ) {
                let subs = [a, b, c, d];
                let above = subs.iter().filter(|s| **s > overall).count();
                let below = subs.iter().any(|s| *s < overall);

                let label = compute_abbreviation(overall, a, b, c, d);
                let expected_base = if below { "B" } else { "Q" };
                prop_assert!(label.starts_with(expected_base));
                prop_assert_eq!(label.len(), 1 + above);
                prop_assert!(label[1..].chars().all(|ch| ch == '+'));
            }
        }
    }
}
