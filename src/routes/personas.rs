use axum::Json;
use serde::Serialize;

use crate::models::{PersonaType, PersonaVector};

#[derive(Debug, Serialize)]
pub struct PersonaSummary {
    #[serde(rename = "type")]
    pub persona_type: PersonaType,
    pub name: &'static str,
    pub vector: PersonaVector,
}

#[derive(Debug, Serialize)]
pub struct PersonaListResponse {
    pub personas: Vec<PersonaSummary>,
}

/// Lists every persona with its prototype vector
pub async fn list_personas() -> Json<PersonaListResponse> {
    let personas = PersonaType::ALL
        .iter()
        .map(|&persona_type| PersonaSummary {
            persona_type,
            name: persona_type.display_name(),
            vector: persona_type.prototype(),
        })
        .collect();

    Json(PersonaListResponse { personas })
}
