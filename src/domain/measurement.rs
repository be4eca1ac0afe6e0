use super::catalog::{MeasurementCatalog, MeasurementType};
use super::persistence::PersistenceDetails;
use super::quantity::Quantity;
use crate::core::{CoachError, Result};
use chrono::{DateTime, Utc};

/// One recorded result for a person inside a cohort.
///
/// Construction checks the quantity against the catalog range for the measurement type;
/// quantities in a convertible unit are normalized to the catalog unit first.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub persistence_details: PersistenceDetails,
    quantity: Quantity,
    repeats: u32,
    timestamp: DateTime<Utc>,
    measurement_type: MeasurementType,
    subject_key: String,
    cohort_key: String,
}

impl Measurement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: &MeasurementCatalog,
        persistence_details: PersistenceDetails,
        quantity: Quantity,
        repeats: u32,
        timestamp: DateTime<Utc>,
        measurement_type: MeasurementType,
        subject_key: impl Into<String>,
        cohort_key: impl Into<String>,
    ) -> Result<Self> {
        let spec = catalog.spec(measurement_type)?;
        let quantity = quantity.convert_to(spec.unit)?;
        if !spec.range.contains(quantity.amount()) {
            return Err(CoachError::invariant(format!(
                "{} of {} is outside the valid range {} {}",
                measurement_type.as_str(),
                quantity,
                spec.range,
                spec.unit
            )));
        }
        if repeats == 0 {
            return Err(CoachError::invariant("repeats must be at least 1"));
        }

        let subject_key = subject_key.into();
        let cohort_key = cohort_key.into();
        if subject_key.is_empty() {
            return Err(CoachError::invariant("measurement subject key must not be empty"));
        }
        if cohort_key.is_empty() {
            return Err(CoachError::invariant("measurement cohort key must not be empty"));
        }

        Ok(Self {
            persistence_details,
            quantity,
            repeats,
            timestamp,
            measurement_type,
            subject_key,
            cohort_key,
        })
    }

    pub fn key(&self) -> Option<&str> {
        self.persistence_details.valid_key()
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn measurement_type(&self) -> MeasurementType {
        self.measurement_type
    }

    pub fn subject_key(&self) -> &str {
        &self.subject_key
    }

    pub fn cohort_key(&self) -> &str {
        &self.cohort_key
    }

    /// True when `self` is the same kind of measurement and better than `previous`.
    pub fn improves_on(&self, previous: &Measurement, catalog: &MeasurementCatalog) -> bool {
        if self.measurement_type != previous.measurement_type {
            return false;
        }
        catalog
            .spec(self.measurement_type)
            .map(|spec| {
                spec.trend
                    .improves(previous.quantity.amount(), self.quantity.amount())
            })
            .unwrap_or(false)
    }
}

/// Best result of the given type, judged by the catalog trend. Earlier results win ties.
pub fn personal_best<'a>(
    measurements: &'a [Measurement],
    measurement_type: MeasurementType,
    catalog: &MeasurementCatalog,
) -> Option<&'a Measurement> {
    measurements
        .iter()
        .filter(|m| m.measurement_type == measurement_type)
        .fold(None, |best: Option<&Measurement>, candidate| match best {
            Some(current) if !candidate.improves_on(current, catalog) => Some(current),
            _ => Some(candidate),
        })
}
