use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lower bound applied to offensive/defensive strength before use.
pub const MIN_STRENGTH: f64 = 0.1;
/// Upper bound applied to offensive/defensive strength before use.
pub const MAX_STRENGTH: f64 = 5.0;
/// Form modifier bounds.
pub const MIN_FORM: f64 = 0.5;
pub const MAX_FORM: f64 = 1.5;

fn default_form() -> f64 {
    1.0
}

/// Which of the two competitors an event or score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Slot used by per-side arrays (`[A, B]`).
    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// One party of a contest.
///
/// Strength values are relative: 1.0 is an average side. Values outside
/// [`MIN_STRENGTH`, `MAX_STRENGTH`] and form outside [`MIN_FORM`, `MAX_FORM`]
/// are clamped by [`Competitor::clamped`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Competitor {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    pub offense: f64,
    pub defense: f64,
    #[serde(default = "default_form")]
    pub form: f64,
}

impl Competitor {
    pub fn new(id: impl Into<String>, offense: f64, defense: f64) -> Self {
        Self { id: id.into(), offense, defense, form: default_form() }
    }

    pub fn with_form(mut self, form: f64) -> Self {
        self.form = form;
        self
    }

    /// Copy with every attribute pulled into its documented range.
    ///
    /// Non-finite values cannot be clamped meaningfully and pass through
    /// unchanged; [`Competitor::is_finite`] catches them at validation.
    pub fn clamped(&self) -> Self {
        Self {
            id: self.id.clone(),
            offense: clamp_finite(self.offense, MIN_STRENGTH, MAX_STRENGTH),
            defense: clamp_finite(self.defense, MIN_STRENGTH, MAX_STRENGTH),
            form: clamp_finite(self.form, MIN_FORM, MAX_FORM),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.offense.is_finite() && self.defense.is_finite() && self.form.is_finite()
    }
}

fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::A.opponent(), Side::B);
        assert_eq!(Side::B.opponent(), Side::A);
        assert_eq!(Side::A.index(), 0);
        assert_eq!(Side::B.index(), 1);
    }

    #[test]
    fn test_clamped_pulls_into_range() {
        let c = Competitor::new("x", -3.0, 40.0).with_form(2.0).clamped();
        assert_eq!(c.offense, MIN_STRENGTH);
        assert_eq!(c.defense, MAX_STRENGTH);
        assert_eq!(c.form, MAX_FORM);
    }

    #[test]
    fn test_non_finite_detected_after_clamp() {
        let c = Competitor::new("x", f64::NAN, 1.0).clamped();
        assert!(!c.is_finite());
    }

    #[test]
    fn test_form_defaults_when_missing() {
        let c: Competitor =
            serde_json::from_str(r#"{"id":"a","offense":1.2,"defense":0.9}"#).unwrap();
        assert_eq!(c.form, 1.0);
    }

    #[test]
    fn test_empty_id_rejected() {
        let c = Competitor::new("", 1.0, 1.0);
        assert!(c.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_clamped_always_in_bounds(
            offense in -100.0f64..100.0,
            defense in -100.0f64..100.0,
            form in -10.0f64..10.0,
        ) {
            let c = Competitor::new("p", offense, defense).with_form(form).clamped();
            prop_assert!(c.offense >= MIN_STRENGTH && c.offense <= MAX_STRENGTH);
            prop_assert!(c.defense >= MIN_STRENGTH && c.defense <= MAX_STRENGTH);
            prop_assert!(c.form >= MIN_FORM && c.form <= MAX_FORM);
        }

        #[test]
        fn prop_clamp_idempotent(offense in -10.0f64..10.0, form in 0.0f64..3.0) {
            let once = Competitor::new("p", offense, 1.0).with_form(form).clamped();
            let twice = once.clamped();
            prop_assert_eq!(once, twice);
        }
    }
}
