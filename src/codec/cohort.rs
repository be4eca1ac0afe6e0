use super::{
    BusinessCodec, Codec, FieldType, MementoSchema, build_persona, encode_persona, encode_timestamp,
    parse_timestamp, persona_schema,
};
use crate::core::{CoachError, FormatError, Result};
use crate::domain::{Cohort, CohortType};
use crate::memento::CohortMemento;

#[derive(Debug, Clone)]
pub struct CohortCodec {
    businesses: BusinessCodec,
    schema: MementoSchema,
}

impl CohortCodec {
    pub fn new() -> Self {
        let businesses = BusinessCodec::new();
        let schema = persona_schema()
            .optional("businessId", FieldType::Text)
            .optional(
                "business",
                FieldType::Object(Box::new(businesses.schema().clone())),
            )
            .require("creationTimestamp", FieldType::Timestamp)
            .require("cohortType", FieldType::Enum(CohortType::names()));

        Self { businesses, schema }
    }

    pub fn businesses(&self) -> &BusinessCodec {
        &self.businesses
    }
}

impl Default for CohortCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for CohortCodec {
    type Entity = Cohort;
    type Memento = CohortMemento;

    fn family(&self) -> &'static str {
        "cohort"
    }

    fn schema(&self) -> &MementoSchema {
        &self.schema
    }

    fn encode(&self, cohort: &Cohort) -> CohortMemento {
        CohortMemento {
            persona: encode_persona(&cohort.persona),
            business_id: cohort.business.key().map(str::to_string),
            business: Some(Box::new(self.businesses.encode(&cohort.business))),
            creation_timestamp: encode_timestamp(&cohort.creation_timestamp),
            cohort_type: cohort.cohort_type.as_str().to_string(),
        }
    }

    fn build(&self, memento: CohortMemento) -> Result<Cohort> {
        let Some(business) = memento.business else {
            let violation = match memento.business_id {
                Some(key) => format!("business: '{key}' was not resolved"),
                None => "business: missing both business and businessId".to_string(),
            };
            return Err(FormatError::single(self.family(), violation).into());
        };

        let cohort_type = CohortType::from_name(&memento.cohort_type).ok_or_else(|| {
            CoachError::invariant(format!("unknown cohort type '{}'", memento.cohort_type))
        })?;

        Ok(Cohort::new(
            build_persona(memento.persona)?,
            self.businesses.build(*business)?,
            parse_timestamp("creationTimestamp", &memento.creation_timestamp)?,
            cohort_type,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire() -> serde_json::Value {
        json!({
            "persistenceDetails": {"sequenceNumber": 2, "schemaVersion": 1},
            "name": "Dawn Patrol",
            "thumbnailUrl": "/img/dawn.png",
            "bio": "6am olympic lifting",
            "creationTimestamp": "2024-02-10T06:00:00.250Z",
            "cohortType": "class",
            "business": {
                "persistenceDetails": {"key": "b-1", "sequenceNumber": 0},
                "name": "Iron Temple",
                "thumbnailUrl": "/img/temple.png",
                "administrators": [{
                    "persistenceDetails": {"key": "p-1", "sequenceNumber": 0},
                    "name": "Sam",
                    "thumbnailUrl": "/img/sam.png",
                    "email": "sam@temple.fit",
                    "loginContext": {"provider": "github", "subject": "sam"},
                    "roles": ["coach"]
                }]
            }
        })
    }

    #[test]
    fn round_trip_keeps_sub_second_timestamps() {
        let codec = CohortCodec::new();
        let cohort = codec.try_create_from(&wire()).unwrap();
        assert_eq!(cohort.business.key(), Some("b-1"));
        let encoded = codec.encode(&cohort);
        assert_eq!(encoded.creation_timestamp, "2024-02-10T06:00:00.250Z");
        assert_eq!(encoded.business_id.as_deref(), Some("b-1"));
        let again = codec.try_create_from(&codec.to_wire(&cohort).unwrap()).unwrap();
        assert_eq!(cohort, again);
    }

    #[test]
    fn unresolved_business_cannot_build() {
        let mut payload = wire();
        payload.as_object_mut().unwrap().remove("business");
        payload["businessId"] = json!("b-1");
        assert!(matches!(
            CohortCodec::new().try_create_from(&payload),
            Err(CoachError::Format(_))
        ));
    }

    #[test]
    fn cohort_type_membership_is_checked_on_decode() {
        let mut payload = wire();
        payload["cohortType"] = json!("bootcamp");
        payload["creationTimestamp"] = json!("last tuesday");
        let err = CohortCodec::new().decode(&payload).unwrap_err();
        assert_eq!(err.violations.len(), 2);
    }
}
