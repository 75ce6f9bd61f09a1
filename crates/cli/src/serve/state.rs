//! Application state and seed data loading.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use convene_core::{Agency, Convention, User};
use convene_engine::Engine;
use convene_storage::{
    AgencyRepository, AssessmentRecord, AssessmentRepository, ConventionRepository,
    InMemoryStore, UserRepository,
};

/// State shared across request handlers.
pub(crate) struct AppState {
    pub(crate) engine: Engine<InMemoryStore>,
}

/// JSON seed file loaded at startup: conventions, agencies, users and
/// assessment markers for the in-memory backend.
#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct SeedData {
    #[serde(default)]
    pub conventions: Vec<Convention>,
    #[serde(default)]
    pub agencies: Vec<Agency>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub assessments: Vec<AssessmentRecord>,
}

impl SeedData {
    pub(crate) fn load(path: &Path) -> Result<SeedData, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("error reading seed file '{}': {}", path.display(), e))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("error parsing seed file '{}': {}", path.display(), e))
    }

    pub(crate) async fn apply(&self, store: &Arc<InMemoryStore>) -> Result<(), String> {
        for agency in &self.agencies {
            store
                .insert_agency(agency)
                .await
                .map_err(|e| e.to_string())?;
        }
        for user in &self.users {
            store.insert_user(user).await.map_err(|e| e.to_string())?;
        }
        for convention in &self.conventions {
            store.insert(convention).await.map_err(|e| e.to_string())?;
        }
        for assessment in &self.assessments {
            store
                .insert_assessment(assessment)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}
