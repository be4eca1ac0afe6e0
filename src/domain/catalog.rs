//! Registry of measurement types.
//!
//! The catalog is built once at startup and handed to whatever needs range or trend
//! lookups (codecs, stores, handlers) by `Arc`. Nothing here is process-global.

use super::quantity::{Range, Unit};
use crate::core::{CoachError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementType {
    Snatch,
    CleanAndJerk,
    BackSquat,
    FrontSquat,
    Deadlift,
    BenchPress,
    StrictPress,
    PullUps,
    PushUps,
    Row2000m,
    Run5000m,
    BodyWeight,
}

impl MeasurementType {
    pub const ALL: [MeasurementType; 12] = [
        MeasurementType::Snatch,
        MeasurementType::CleanAndJerk,
        MeasurementType::BackSquat,
        MeasurementType::FrontSquat,
        MeasurementType::Deadlift,
        MeasurementType::BenchPress,
        MeasurementType::StrictPress,
        MeasurementType::PullUps,
        MeasurementType::PushUps,
        MeasurementType::Row2000m,
        MeasurementType::Run5000m,
        MeasurementType::BodyWeight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::Snatch => "snatch",
            MeasurementType::CleanAndJerk => "cleanAndJerk",
            MeasurementType::BackSquat => "backSquat",
            MeasurementType::FrontSquat => "frontSquat",
            MeasurementType::Deadlift => "deadlift",
            MeasurementType::BenchPress => "benchPress",
            MeasurementType::StrictPress => "strictPress",
            MeasurementType::PullUps => "pullUps",
            MeasurementType::PushUps => "pushUps",
            MeasurementType::Row2000m => "row2000m",
            MeasurementType::Run5000m => "run5000m",
            MeasurementType::BodyWeight => "bodyWeight",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(MeasurementType::as_str).collect()
    }
}

/// Which direction counts as progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    HigherIsBetter,
    LowerIsBetter,
    Neutral,
}

impl Trend {
    pub fn improves(&self, previous: f64, current: f64) -> bool {
        match self {
            Trend::HigherIsBetter => current > previous,
            Trend::LowerIsBetter => current < previous,
            Trend::Neutral => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSpec {
    pub range: Range,
    pub unit: Unit,
    pub trend: Trend,
}

impl MeasurementSpec {
    pub fn new(low: f64, high: f64, unit: Unit, trend: Trend) -> Result<Self> {
        Ok(Self {
            range: Range::new(low, high)?,
            unit,
            trend,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MeasurementCatalog {
    specs: HashMap<MeasurementType, MeasurementSpec>,
}

impl MeasurementCatalog {
    pub fn new(entries: impl IntoIterator<Item = (MeasurementType, MeasurementSpec)>) -> Self {
        Self {
            specs: entries.into_iter().collect(),
        }
    }

    /// The ranges the coaching product ships with.
    pub fn standard() -> Self {
        use MeasurementType::*;
        use Trend::*;
        use Unit::*;

        let table: [(MeasurementType, f64, f64, Unit, Trend); 12] = [
            (Snatch, 0.0, 250.0, Kilogram, HigherIsBetter),
            (CleanAndJerk, 0.0, 300.0, Kilogram, HigherIsBetter),
            (BackSquat, 0.0, 500.0, Kilogram, HigherIsBetter),
            (FrontSquat, 0.0, 400.0, Kilogram, HigherIsBetter),
            (Deadlift, 0.0, 500.0, Kilogram, HigherIsBetter),
            (BenchPress, 0.0, 350.0, Kilogram, HigherIsBetter),
            (StrictPress, 0.0, 200.0, Kilogram, HigherIsBetter),
            (PullUps, 0.0, 100.0, Repetition, HigherIsBetter),
            (PushUps, 0.0, 200.0, Repetition, HigherIsBetter),
            (Row2000m, 300.0, 900.0, Second, LowerIsBetter),
            (Run5000m, 720.0, 3600.0, Second, LowerIsBetter),
            (BodyWeight, 20.0, 300.0, Kilogram, Neutral),
        ];

        Self {
            specs: table
                .into_iter()
                .map(|(kind, low, high, unit, trend)| {
                    (
                        kind,
                        MeasurementSpec {
                            range: Range::new(low, high).expect("static catalog range is ordered"),
                            unit,
                            trend,
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn spec(&self, kind: MeasurementType) -> Result<&MeasurementSpec> {
        self.specs.get(&kind).ok_or_else(|| {
            CoachError::invariant(format!(
                "measurement type '{}' is not in the catalog",
                kind.as_str()
            ))
        })
    }

    pub fn lookup(&self, name: &str) -> Option<(MeasurementType, &MeasurementSpec)> {
        let kind = MeasurementType::from_name(name)?;
        self.specs.get(&kind).map(|spec| (kind, spec))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for MeasurementCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_covers_every_type() {
        let catalog = MeasurementCatalog::standard();
        assert_eq!(catalog.len(), MeasurementType::ALL.len());
        for kind in MeasurementType::ALL {
            assert!(catalog.spec(kind).is_ok());
        }
    }

    #[test]
    fn lookup_by_wire_name() {
        let catalog = MeasurementCatalog::standard();
        let (kind, spec) = catalog.lookup("snatch").unwrap();
        assert_eq!(kind, MeasurementType::Snatch);
        assert_eq!(spec.range.high(), 250.0);
        assert_eq!(spec.unit, Unit::Kilogram);
        assert!(catalog.lookup("curl").is_none());
    }

    #[test]
    fn custom_catalog_reports_missing_types() {
        let catalog = MeasurementCatalog::new([(
            MeasurementType::Deadlift,
            MeasurementSpec::new(0.0, 10.0, Unit::Kilogram, Trend::HigherIsBetter).unwrap(),
        )]);
        assert!(catalog.spec(MeasurementType::Deadlift).is_ok());
        assert!(matches!(
            catalog.spec(MeasurementType::Snatch),
            Err(CoachError::DomainInvariant(_))
        ));
    }

    #[test]
    fn trend_direction() {
        assert!(Trend::HigherIsBetter.improves(100.0, 102.5));
        assert!(Trend::LowerIsBetter.improves(420.0, 415.0));
        assert!(!Trend::Neutral.improves(80.0, 79.0));
    }
}
