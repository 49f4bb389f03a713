//! Participant lists from CSV (`id,name,seed`, header row required).

use crate::models::{Participant, ValidationError};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ParticipantRow {
    #[serde(default)]
    id: Option<Uuid>,
    name: String,
    #[serde(default)]
    seed: Option<u32>,
}

/// Read participants in file order. Missing ids are generated, missing seeds
/// default to the row position.
pub fn parse_participants_csv<R: Read>(reader: R) -> Result<Vec<Participant>, ValidationError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut participants = Vec::new();
    let mut seen = HashSet::new();
    for (index, row) in rdr.deserialize::<ParticipantRow>().enumerate() {
        let row = row.map_err(|e| ValidationError::MalformedParticipants(e.to_string()))?;
        if row.name.is_empty() {
            return Err(ValidationError::MalformedParticipants(format!(
                "row {} has no name",
                index + 1
            )));
        }
        let id = row.id.unwrap_or_else(Uuid::new_v4);
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateParticipant(id));
        }
        participants.push(Participant {
            id,
            name: row.name,
            seed: Some(row.seed.unwrap_or(index as u32 + 1)),
        });
    }
    Ok(participants)
}
