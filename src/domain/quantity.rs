use crate::core::{CoachError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Mass,
    Time,
    Distance,
    Count,
}

/// Units a measurement can be recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Kilogram,
    Pound,
    Second,
    Minute,
    Metre,
    Repetition,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Kilogram,
        Unit::Pound,
        Unit::Second,
        Unit::Minute,
        Unit::Metre,
        Unit::Repetition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Pound => "lb",
            Unit::Second => "s",
            Unit::Minute => "min",
            Unit::Metre => "m",
            Unit::Repetition => "reps",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.as_str() == name)
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Unit::as_str).collect()
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Kilogram | Unit::Pound => Dimension::Mass,
            Unit::Second | Unit::Minute => Dimension::Time,
            Unit::Metre => Dimension::Distance,
            Unit::Repetition => Dimension::Count,
        }
    }

    /// Factor converting one of this unit into the dimension's base unit.
    fn to_base(&self) -> f64 {
        match self {
            Unit::Pound => 0.453_592_37,
            Unit::Minute => 60.0,
            Unit::Kilogram | Unit::Second | Unit::Metre | Unit::Repetition => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    amount: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(amount: f64, unit: Unit) -> Result<Self> {
        if !amount.is_finite() {
            return Err(CoachError::invariant(format!(
                "quantity amount must be finite, got {amount}"
            )));
        }
        Ok(Self { amount, unit })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn convert_to(&self, target: Unit) -> Result<Self> {
        if self.unit == target {
            return Ok(*self);
        }
        if self.unit.dimension() != target.dimension() {
            return Err(CoachError::invariant(format!(
                "cannot convert {} to {}",
                self.unit, target
            )));
        }
        Self::new(self.amount * self.unit.to_base() / target.to_base(), target)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    low: f64,
    high: f64,
}

impl Range {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(CoachError::invariant(format!(
                "invalid range [{low}, {high}]"
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_names_round_trip() {
        for unit in Unit::ALL {
            assert_eq!(Unit::from_name(unit.as_str()), Some(unit));
        }
        assert_eq!(Unit::from_name("stone"), None);
    }

    #[test]
    fn converts_within_a_dimension() {
        let pounds = Quantity::new(220.462_262_18, Unit::Pound).unwrap();
        let kilos = pounds.convert_to(Unit::Kilogram).unwrap();
        assert!((kilos.amount() - 100.0).abs() < 1e-6);

        let minutes = Quantity::new(2.5, Unit::Minute).unwrap();
        assert_eq!(minutes.convert_to(Unit::Second).unwrap().amount(), 150.0);

        assert!(pounds.convert_to(Unit::Second).is_err());
    }

    #[test]
    fn rejects_non_finite_amounts() {
        assert!(Quantity::new(f64::NAN, Unit::Kilogram).is_err());
        assert!(Quantity::new(f64::INFINITY, Unit::Metre).is_err());
    }

    #[test]
    fn range_is_inclusive() {
        let range = Range::new(0.0, 250.0).unwrap();
        assert!(range.contains(0.0));
        assert!(range.contains(250.0));
        assert!(!range.contains(250.01));
        assert!(!range.contains(-0.5));
        assert!(Range::new(10.0, 1.0).is_err());
    }
}
