/*
 * Responsibility
 * - /preferences/options と /preferences/user/{patientId} の DTO
 * - repo の平坦な行 (type / option / user) を入れ子の response に組み立てる
 */
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::preference_repo::{
    PreferenceOptionRow, PreferenceTypeRow, PreferenceUpdate, UserPreferenceRow,
};

const MAX_PREFERENCES: usize = 20;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OptionEntry {
    pub display: String,
    pub value: i32,
}

fn options_by_type(options: Vec<PreferenceOptionRow>) -> BTreeMap<i32, Vec<OptionEntry>> {
    let mut grouped: BTreeMap<i32, Vec<OptionEntry>> = BTreeMap::new();
    for o in options {
        grouped.entry(o.preference_type_id).or_default().push(OptionEntry {
            display: o.preference_option_display,
            value: o.preference_option_value,
        });
    }
    grouped
}

// ---- GET /preferences/options ----

#[derive(Debug, Serialize)]
pub struct OptionsType {
    pub id: i32,
    pub display: String,
    pub options: Vec<OptionEntry>,
}

#[derive(Debug, Serialize)]
pub struct OptionsEntry {
    #[serde(rename = "type")]
    pub kind: OptionsType,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub preferences: Vec<OptionsEntry>,
}

impl OptionsResponse {
    /// `None` when no preference types exist.
    pub fn from_rows(types: Vec<PreferenceTypeRow>, options: Vec<PreferenceOptionRow>) -> Option<Self> {
        if types.is_empty() {
            return None;
        }

        let mut grouped = options_by_type(options);
        let preferences = types
            .into_iter()
            .map(|t| OptionsEntry {
                kind: OptionsType {
                    id: t.preference_type_id,
                    options: grouped.remove(&t.preference_type_id).unwrap_or_default(),
                    display: t.preference_type,
                },
            })
            .collect();

        Some(Self { preferences })
    }
}

// ---- GET /preferences/user/{patientId} ----

#[derive(Debug, Serialize)]
pub struct UserType {
    pub id: i32,
    pub display: String,
    pub priority: i32,
    pub selected: i32,
    pub options: Vec<OptionEntry>,
}

#[derive(Debug, Serialize)]
pub struct UserEntry {
    #[serde(rename = "type")]
    pub kind: UserType,
}

#[derive(Debug, Serialize)]
pub struct UserMeta {
    pub created: DateTime<Utc>,
    pub lastupdated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserPreferencesResponse {
    pub id: String,
    pub meta: UserMeta,
    pub preferences: Vec<UserEntry>,
}

impl UserPreferencesResponse {
    /// `None` when the patient has no stored preferences.
    pub fn from_rows(
        patient_id: &str,
        rows: Vec<UserPreferenceRow>,
        options: Vec<PreferenceOptionRow>,
    ) -> Option<Self> {
        let created = rows.iter().map(|r| r.created).min()?;
        let lastupdated = rows.iter().map(|r| r.last_updated).max()?;

        let grouped = options_by_type(options);
        let preferences = rows
            .into_iter()
            .map(|r| UserEntry {
                kind: UserType {
                    id: r.preference_type_id,
                    options: grouped.get(&r.preference_type_id).cloned().unwrap_or_default(),
                    display: r.preference_type,
                    priority: r.preference_priority,
                    selected: r.preference_value_id,
                },
            })
            .collect();

        Some(Self {
            id: patient_id.to_string(),
            meta: UserMeta { created, lastupdated },
            preferences,
        })
    }
}

// ---- PUT /preferences/user/{patientId} ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreferenceSelection {
    pub id: i32,
    pub priority: i32,
    pub selected: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserPreferencesRequest {
    pub preferences: Vec<PreferenceSelection>,
}

impl UpdateUserPreferencesRequest {
    pub fn validate(&self) -> Result<Vec<PreferenceUpdate>, String> {
        if self.preferences.is_empty() {
            return Err("body/preferences must NOT have fewer than 1 items".to_string());
        }
        if self.preferences.len() > MAX_PREFERENCES {
            return Err(format!(
                "body/preferences must NOT have more than {MAX_PREFERENCES} items"
            ));
        }

        let mut seen = HashSet::new();
        self.preferences
            .iter()
            .map(|p| {
                if p.id < 1 || p.selected < 1 || p.priority < 0 {
                    return Err(format!("body/preferences entry for type {} is out of range", p.id));
                }
                if !seen.insert(p.id) {
                    return Err(format!("body/preferences contains type {} more than once", p.id));
                }
                Ok(PreferenceUpdate {
                    type_id: p.id,
                    priority: p.priority,
                    value_id: p.selected,
                })
            })
            .collect()
    }
}
