//! The software catalog: CRUD over downloadable software entries.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{msg, AppError, OrNotFound, Result};
use crate::models::{CreateSoftware, Software};
use crate::registry::KeyRegistry;
use crate::store::SoftwareStore;

/// Manages software entries and owns the delete-time key cascade.
#[derive(Clone)]
pub struct SoftwareCatalog {
    software: Arc<dyn SoftwareStore>,
    registry: KeyRegistry,
}

impl SoftwareCatalog {
    pub fn new(software: Arc<dyn SoftwareStore>, registry: KeyRegistry) -> Self {
        Self { software, registry }
    }

    fn validate_input(input: &CreateSoftware) -> Result<()> {
        if input.name.trim().is_empty() {
            return Err(AppError::BadRequest("Software name must not be empty".into()));
        }
        if input.download_urls.is_empty() {
            return Err(AppError::BadRequest(
                "At least one download URL is required".into(),
            ));
        }
        if input.download_urls.iter().any(|url| url.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "Download URLs must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Create a software entry. Names are unique, case-sensitive.
    pub fn create(&self, input: CreateSoftware) -> Result<Software> {
        Self::validate_input(&input)?;

        if self.software.get_by_name(&input.name)?.is_some() {
            return Err(AppError::Conflict(msg::DUPLICATE_SOFTWARE_NAME.into()));
        }

        let software = Software {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            file_type: input.file_type,
            download_urls: input.download_urls,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.software.insert(&software)?;
        Ok(software)
    }

    pub fn get(&self, id: &str) -> Result<Software> {
        self.software.get(id)?.or_not_found(msg::SOFTWARE_NOT_FOUND)
    }

    pub fn list(&self) -> Result<Vec<Software>> {
        self.software.list()
    }

    /// Update a software entry, preserving id and creation time.
    pub fn update(&self, id: &str, input: CreateSoftware) -> Result<Software> {
        Self::validate_input(&input)?;

        let existing = self.get(id)?;

        if let Some(other) = self.software.get_by_name(&input.name)? {
            if other.id != id {
                return Err(AppError::Conflict(msg::DUPLICATE_SOFTWARE_NAME.into()));
            }
        }

        let software = Software {
            id: existing.id,
            name: input.name,
            file_type: input.file_type,
            download_urls: input.download_urls,
            created_at: existing.created_at,
            updated_at: Some(Utc::now()),
        };
        if !self.software.update(&software)? {
            return Err(AppError::NotFound(msg::SOFTWARE_NOT_FOUND.into()));
        }
        Ok(software)
    }

    /// Delete a software entry and sweep its keys.
    ///
    /// The two steps run sequentially, not in one transaction: a crash in
    /// between leaves orphaned keys, which the registry tolerates by
    /// joining them to no software.
    pub fn delete(&self, id: &str) -> Result<()> {
        if !self.software.delete(id)? {
            return Err(AppError::NotFound(msg::SOFTWARE_NOT_FOUND.into()));
        }
        let swept = self.registry.cascade_delete_for_software(id)?;
        if swept > 0 {
            tracing::info!("Deleted {} keys for removed software {}", swept, id);
        }
        Ok(())
    }
}
