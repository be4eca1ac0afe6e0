use super::{
    Codec, FieldType, MementoSchema, build_details, encode_details, encode_timestamp,
    parse_timestamp, persistence_schema,
};
use crate::core::{CoachError, Result};
use crate::domain::{Measurement, MeasurementCatalog, MeasurementType, Quantity, Unit};
use crate::memento::{MeasurementMemento, QuantityMemento};
use std::sync::Arc;

/// Codec for measurements. Carries the catalog so `build` can check ranges.
#[derive(Debug, Clone)]
pub struct MeasurementCodec {
    catalog: Arc<MeasurementCatalog>,
    schema: MementoSchema,
}

impl MeasurementCodec {
    pub fn new(catalog: Arc<MeasurementCatalog>) -> Self {
        let quantity_schema = MementoSchema::object()
            .require("amount", FieldType::Number)
            .require("unit", FieldType::Enum(Unit::names()));

        let schema = MementoSchema::object()
            .require(
                "persistenceDetails",
                FieldType::Object(Box::new(persistence_schema())),
            )
            .require("quantity", FieldType::Object(Box::new(quantity_schema)))
            .require("repeats", FieldType::Integer)
            .require("timestamp", FieldType::Timestamp)
            .require("measurementType", FieldType::Enum(MeasurementType::names()))
            .require("subjectKey", FieldType::Text)
            .require("cohortKey", FieldType::Text);

        Self { catalog, schema }
    }

    pub fn catalog(&self) -> &Arc<MeasurementCatalog> {
        &self.catalog
    }
}

impl Codec for MeasurementCodec {
    type Entity = Measurement;
    type Memento = MeasurementMemento;

    fn family(&self) -> &'static str {
        "measurement"
    }

    fn schema(&self) -> &MementoSchema {
        &self.schema
    }

    fn encode(&self, measurement: &Measurement) -> MeasurementMemento {
        let quantity = measurement.quantity();
        MeasurementMemento {
            persistence_details: encode_details(&measurement.persistence_details),
            quantity: QuantityMemento {
                amount: quantity.amount(),
                unit: quantity.unit().as_str().to_string(),
            },
            repeats: measurement.repeats(),
            timestamp: encode_timestamp(&measurement.timestamp()),
            measurement_type: measurement.measurement_type().as_str().to_string(),
            subject_key: measurement.subject_key().to_string(),
            cohort_key: measurement.cohort_key().to_string(),
        }
    }

    fn build(&self, memento: MeasurementMemento) -> Result<Measurement> {
        let unit = Unit::from_name(&memento.quantity.unit).ok_or_else(|| {
            CoachError::invariant(format!("unknown unit '{}'", memento.quantity.unit))
        })?;
        let measurement_type =
            MeasurementType::from_name(&memento.measurement_type).ok_or_else(|| {
                CoachError::invariant(format!(
                    "unknown measurement type '{}'",
                    memento.measurement_type
                ))
            })?;

        Measurement::new(
            &self.catalog,
            build_details(memento.persistence_details),
            Quantity::new(memento.quantity.amount, unit)?,
            memento.repeats,
            parse_timestamp("timestamp", &memento.timestamp)?,
            measurement_type,
            memento.subject_key,
            memento.cohort_key,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec() -> MeasurementCodec {
        MeasurementCodec::new(Arc::new(MeasurementCatalog::standard()))
    }

    fn wire(amount: f64) -> serde_json::Value {
        json!({
            "persistenceDetails": {"sequenceNumber": 0},
            "quantity": {"amount": amount, "unit": "kg"},
            "repeats": 1,
            "timestamp": "2024-03-01T07:15:00Z",
            "measurementType": "snatch",
            "subjectKey": "p-1",
            "cohortKey": "c-1"
        })
    }

    #[test]
    fn round_trip_is_structurally_equal() {
        let codec = codec();
        let measurement = codec.try_create_from(&wire(82.5)).unwrap();
        let again = codec
            .try_create_from(&codec.to_wire(&measurement).unwrap())
            .unwrap();
        assert_eq!(measurement, again);
    }

    #[test]
    fn range_is_enforced_at_build_with_inclusive_bounds() {
        let codec = codec();
        assert!(codec.try_create_from(&wire(0.0)).is_ok());
        assert!(codec.try_create_from(&wire(250.0)).is_ok());
        assert!(matches!(
            codec.try_create_from(&wire(250.5)),
            Err(CoachError::DomainInvariant(_))
        ));
    }

    #[test]
    fn unknown_measurement_type_is_a_format_error() {
        let mut payload = wire(50.0);
        payload["measurementType"] = json!("curl");
        payload["quantity"]["unit"] = json!("stone");
        let err = codec().decode(&payload).unwrap_err();
        assert_eq!(err.family, "measurement");
        assert_eq!(err.violations.len(), 2);
    }

    #[test]
    fn decode_many_prefixes_violations_with_the_index() {
        let payload = json!([wire(50.0), {"repeats": "three"}]);
        let err = codec().decode_many(&payload).unwrap_err();
        assert!(err.violations.iter().all(|v| v.starts_with("[1].")));
    }
}
