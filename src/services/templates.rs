// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Template storage.
//!
//! Templates are user-owned and few, so they live in a single per-user
//! document (`templates/{userId}`) holding a map under `templates`, with
//! the same key→id promotion as shard items.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{EngineError, Result};
use crate::models::{ActivityTemplate, EntityId};
use crate::store::{scrub_nulls, template_path, DocumentStore};

const TEMPLATES_FIELD: &str = "templates";

pub struct TemplateService<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> TemplateService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All templates owned by `user`, map keys promoted to ids. No sort
    /// order is guaranteed.
    pub async fn list(&self, user: &EntityId) -> Result<Vec<ActivityTemplate>> {
        let items = self.load_map(user).await?;
        let mut templates = Vec::with_capacity(items.len());
        for (key, raw) in items {
            match serde_json::from_value::<ActivityTemplate>(raw) {
                Ok(mut template) => {
                    template.id = key;
                    templates.push(template);
                }
                Err(err) => {
                    tracing::warn!(template_key = %key, error = %err, "Skipping undecodable template");
                }
            }
        }
        Ok(templates)
    }

    /// Create or update a template. A template without an id gets a fresh
    /// one. Returns the stored template, id populated.
    pub async fn save(&self, user: &EntityId, mut template: ActivityTemplate) -> Result<ActivityTemplate> {
        if template.name.is_empty() {
            return Err(EngineError::Validation(
                "template name is required".to_string(),
            ));
        }
        if template.reminder_minutes.is_some() && template.reminder_time.is_some() {
            return Err(EngineError::Validation(
                "reminderMinutes and reminderTime are mutually exclusive".to_string(),
            ));
        }
        if template.id.is_empty() {
            template.id = uuid::Uuid::new_v4().to_string();
        }

        let mut items = self.load_map(user).await?;
        let mut stored = template.clone();
        stored.id = String::new();
        let raw = serde_json::to_value(&stored).map_err(|e| {
            EngineError::Internal(anyhow::anyhow!("template serialization failed: {}", e))
        })?;
        items.insert(template.id.clone(), raw);
        self.write_map(user, items).await?;

        tracing::debug!(user = %user, template_id = %template.id, "Template saved");
        Ok(template)
    }

    /// Remove a template by id.
    pub async fn delete(&self, user: &EntityId, template_id: &str) -> Result<()> {
        let mut items = self.load_map(user).await?;
        if items.remove(template_id).is_none() {
            return Err(EngineError::NotFound(format!("template {}", template_id)));
        }
        self.write_map(user, items).await?;
        tracing::debug!(user = %user, template_id, "Template deleted");
        Ok(())
    }

    async fn load_map(&self, user: &EntityId) -> Result<Map<String, Value>> {
        let path = template_path(user);
        Ok(self
            .store
            .get(&path)
            .await?
            .and_then(|doc| doc.get(TEMPLATES_FIELD).and_then(Value::as_object).cloned())
            .unwrap_or_default())
    }

    async fn write_map(&self, user: &EntityId, items: Map<String, Value>) -> Result<()> {
        let path = template_path(user);
        let mut patch = Value::Object(Map::from_iter([(
            TEMPLATES_FIELD.to_string(),
            Value::Object(items),
        )]));
        scrub_nulls(&mut patch);
        self.store.set_merge(&path, patch).await
    }
}
