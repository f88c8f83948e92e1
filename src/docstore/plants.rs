use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DocPath, DocumentStore, DocumentSubscription, SetOptions};
use crate::error::ValidationError;

pub const DEFAULT_APP_ID: &str = "plantpal-3d";

/// Path of a user's shared plant document.
pub fn plant_doc_path(app_id: &str, user_id: &str) -> Result<DocPath, ValidationError> {
    DocPath::from_segments(&["artifacts", app_id, "public", "data", "plants", user_id])
}

/// One entry in the public garden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicPlant {
    pub user_id: String,
    pub data: Value,
}

/// Per-user plant documents under `artifacts/{app_id}/public/data/plants`.
#[derive(Clone)]
pub struct PlantDocService {
    store: DocumentStore,
    app_id: String,
}

impl PlantDocService {
    pub fn new(store: DocumentStore, app_id: impl Into<String>) -> Self {
        Self {
            store,
            app_id: app_id.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    fn path(&self, user_id: &str) -> Result<DocPath> {
        Ok(plant_doc_path(&self.app_id, user_id)?)
    }

    pub fn get_plant_data(&self, user_id: &str) -> Result<Option<Value>> {
        let path = self.path(user_id)?;
        self.store.get(&path).inspect_err(|e| {
            tracing::error!("Error fetching plant data for {}: {:#}", user_id, e);
        })
    }

    /// Merge `patch` into the user's document, stamping `lastUpdated` and `userId`.
    pub fn update_plant_data(&self, user_id: &str, patch: Value) -> Result<Value> {
        self.write(user_id, patch, SetOptions::merge())
    }

    /// Replace the user's document with `data`, stamped like an update.
    pub fn replace_plant_data(&self, user_id: &str, data: Value) -> Result<Value> {
        self.write(user_id, data, SetOptions::replace())
    }

    pub fn delete_plant_data(&self, user_id: &str) -> Result<bool> {
        let path = self.path(user_id)?;
        self.store.delete(&path)
    }

    pub fn listen(&self, user_id: &str) -> Result<DocumentSubscription> {
        let path = self.path(user_id)?;
        self.store.subscribe(&path)
    }

    /// Every user's plant document, ordered by user id.
    pub fn public_plants(&self) -> Result<Vec<PublicPlant>> {
        let collection = format!("artifacts/{}/public/data/plants", self.app_id);
        let docs = self.store.list(&collection)?;
        Ok(docs
            .into_iter()
            .map(|(user_id, data)| PublicPlant { user_id, data })
            .collect())
    }

    fn write(&self, user_id: &str, data: Value, options: SetOptions) -> Result<Value> {
        let path = self.path(user_id)?;
        let Value::Object(mut fields) = data else {
            return Err(ValidationError::invalid("plant data must be a JSON object").into());
        };
        fields.insert(
            "lastUpdated".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        fields.insert("userId".to_string(), Value::String(user_id.to_string()));

        self.store
            .set(&path, Value::Object(fields), options)
            .inspect_err(|e| {
                tracing::error!("Error updating plant data for {}: {:#}", user_id, e);
            })
    }
}
