//! Serializable snapshots of entity state.
//!
//! Mementos hold primitives, value shapes and other mementos only. Cross-entity references
//! appear twice: as a foreign-key field that is stored, and as a transient expanded field
//! that exists only in memory during a save or load and is skipped when empty.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceDetailsMemento {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub sequence_number: u64,
}

impl PersistenceDetailsMemento {
    pub fn valid_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaMemento {
    pub persistence_details: PersistenceDetailsMemento,
    pub name: String,
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginContextMemento {
    pub provider: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonMemento {
    #[serde(flatten)]
    pub persona: PersonaMemento,
    pub email: String,
    pub login_context: LoginContextMemento,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMemento {
    #[serde(flatten)]
    pub persona: PersonaMemento,
    #[serde(default)]
    pub administrator_ids: Vec<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub administrators: Vec<PersonMemento>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<PersonMemento>,
}

impl BusinessMemento {
    /// Drops the expanded people, keeping only foreign keys.
    pub fn flatten(&mut self) {
        self.administrators.clear();
        self.members.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortMemento {
    #[serde(flatten)]
    pub persona: PersonaMemento,
    #[serde(default)]
    pub business_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<Box<BusinessMemento>>,
    pub creation_timestamp: String,
    pub cohort_type: String,
}

impl CohortMemento {
    pub fn flatten(&mut self) {
        self.business = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityMemento {
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementMemento {
    pub persistence_details: PersistenceDetailsMemento,
    pub quantity: QuantityMemento,
    pub repeats: u32,
    pub timestamp: String,
    pub measurement_type: String,
    pub subject_key: String,
    pub cohort_key: String,
}

/// Access to the storage envelope of any memento.
pub trait Memento: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn persistence_details(&self) -> &PersistenceDetailsMemento;
    fn persistence_details_mut(&mut self) -> &mut PersistenceDetailsMemento;
}

impl Memento for PersonMemento {
    fn persistence_details(&self) -> &PersistenceDetailsMemento {
        &self.persona.persistence_details
    }

    fn persistence_details_mut(&mut self) -> &mut PersistenceDetailsMemento {
        &mut self.persona.persistence_details
    }
}

impl Memento for BusinessMemento {
    fn persistence_details(&self) -> &PersistenceDetailsMemento {
        &self.persona.persistence_details
    }

    fn persistence_details_mut(&mut self) -> &mut PersistenceDetailsMemento {
        &mut self.persona.persistence_details
    }
}

impl Memento for CohortMemento {
    fn persistence_details(&self) -> &PersistenceDetailsMemento {
        &self.persona.persistence_details
    }

    fn persistence_details_mut(&mut self) -> &mut PersistenceDetailsMemento {
        &mut self.persona.persistence_details
    }
}

impl Memento for MeasurementMemento {
    fn persistence_details(&self) -> &PersistenceDetailsMemento {
        &self.persistence_details
    }

    fn persistence_details_mut(&mut self) -> &mut PersistenceDetailsMemento {
        &mut self.persistence_details
    }
}
