//! Composite patient-history persistence.
//!
//! A history record is one parent row (the flattened intake form) plus up to
//! three independent sets of medication-usage rows, each linked to the
//! parent through its own association table: prescription medication,
//! over-the-counter medication, and recreational drug use.
//!
//! The write is a plain sequence — parent row, then usage + association row
//! pairs list by list — with no multi-statement transaction underneath. A
//! mid-sequence storage failure surfaces as one failure outcome; rows
//! already inserted stay in place and are logged for reconciliation.
//!
//! The record deliberately stays plain JSON on the wire; there is no
//! interchange resource shape for an intake questionnaire of this form.

use crate::schema::tables;
use crate::validate::{datetime_value, get_i64};
use crate::{CoreError, CoreResult};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use ward_store::{Predicate, Row, Store, StoreError};

// ============================================================================
// Intake form
// ============================================================================

/// The structured intake form as submitted.
///
/// Free-form answer groups stay [`Value`]; the writer serialises them into
/// opaque JSON-string columns. Field names follow the form's kebab-case
/// keys.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct HistoryIntake {
    #[serde(default)]
    pub health: HealthAnswers,
    #[serde(default)]
    pub medication: MedicationAnswers,
    #[serde(default)]
    pub exercise: ExerciseAnswers,
    #[serde(default)]
    pub diet: DietAnswers,
    #[serde(default)]
    pub alcohol: AlcoholAnswers,
    /// Weekly drink count; asked outside the alcohol group on the form.
    #[serde(default)]
    pub alcoholfreq: Option<Value>,
    #[serde(default)]
    pub tobacco: TobaccoAnswers,
    #[serde(default)]
    pub drug: DrugAnswers,
    #[serde(default)]
    pub other: OtherAnswers,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub sign: SignOff,
}

impl HistoryIntake {
    pub fn parse(value: Value) -> CoreResult<Self> {
        serde_json::from_value(value).map_err(|e| CoreError::Document(e.into()))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HealthAnswers {
    #[serde(rename = "childhood-illnesses", default)]
    pub childhood_illnesses: Option<Value>,
    #[serde(default)]
    pub immunisations: Option<Value>,
    #[serde(rename = "medical-issues", default)]
    pub medical_issues: Option<Value>,
    #[serde(default)]
    pub operations: Option<Value>,
    // Historical intake clients misspell this key; accept both.
    #[serde(default, alias = "hispitalisations")]
    pub hospitalisations: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MedicationAnswers {
    #[serde(default)]
    pub allergies: Option<Value>,
    #[serde(default)]
    pub prescription: Vec<MedicationEntry>,
    #[serde(default)]
    pub otc: Vec<MedicationEntry>,
}

/// One medication or drug usage line: what, how much, how often.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MedicationEntry {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub dose: Option<Value>,
    #[serde(default)]
    pub freq: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExerciseAnswers {
    #[serde(default)]
    pub frequency: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DietAnswers {
    #[serde(default)]
    pub dieting: Option<Value>,
    #[serde(rename = "difficulties-eating", default)]
    pub difficulties_eating: Option<Value>,
    #[serde(rename = "meals-eaten", default)]
    pub meals_eaten: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AlcoholAnswers {
    #[serde(rename = "does-drink", default)]
    pub does_drink: Option<Value>,
    #[serde(rename = "type", default)]
    pub kind: Option<Value>,
    #[serde(default)]
    pub concern: Option<Value>,
    #[serde(rename = "consider-stopping", default)]
    pub consider_stopping: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TobaccoAnswers {
    #[serde(rename = "used-prior", default)]
    pub used_prior: Option<Value>,
    #[serde(rename = "last-use", default)]
    pub last_use: Option<Value>,
    #[serde(rename = "type-used", default)]
    pub type_used: Option<Value>,
    #[serde(rename = "current-use", default)]
    pub current_use: Option<Value>,
    #[serde(rename = "nicotine-replace-therapy", default)]
    pub replacement_therapy: Option<Value>,
    #[serde(rename = "nicotine-replacement-types", default)]
    pub replacement_types: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DrugAnswers {
    #[serde(rename = "currently-use", default)]
    pub currently_use: Option<Value>,
    #[serde(default)]
    pub injected: Option<Value>,
    #[serde(rename = "use-frequency", default)]
    pub use_frequency: Vec<MedicationEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OtherAnswers {
    #[serde(rename = "mental-health-wellbeing", default)]
    pub mental_health: Option<Value>,
    #[serde(rename = "social-history", default)]
    pub social_history: Option<Value>,
    #[serde(rename = "family-history", default)]
    pub family_history: Option<Value>,
    #[serde(rename = "relevant-history", default)]
    pub relevant_history: Option<Value>,
}

/// The mandatory sign-off block.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignOff {
    #[serde(default)]
    pub practitioner_id: Option<i64>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub designation: Option<String>,
    /// Signature image payload, stored opaquely.
    #[serde(default)]
    pub image: Option<Value>,
}

// ============================================================================
// Writer / reader
// ============================================================================

pub struct HistoryWriter {
    store: Arc<dyn Store>,
}

impl HistoryWriter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Persists one intake: parent row first, then each usage list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingDesignation`] before anything is written
    /// when the sign-off designation is absent. A storage failure after the
    /// parent insert leaves earlier rows in place (logged) and surfaces as
    /// the single failure for the whole operation.
    pub async fn write(&self, intake: &HistoryIntake) -> CoreResult<i64> {
        if intake
            .sign
            .designation
            .as_deref()
            .map_or(true, str::is_empty)
        {
            return Err(CoreError::MissingDesignation);
        }

        let stored = self
            .store
            .insert(tables::PATIENT_HISTORY, parent_row(intake))
            .await?;
        let history_id = get_i64(&stored, "history_id").ok_or_else(|| {
            CoreError::Storage(StoreError::Backend(
                "history insert returned no generated id".to_string(),
            ))
        })?;

        let lists = [
            (
                &intake.medication.prescription,
                tables::HISTORY_PRESCRIPTION_USAGE,
            ),
            (&intake.medication.otc, tables::HISTORY_OTC_USAGE),
            (&intake.drug.use_frequency, tables::HISTORY_RECREATIONAL_USAGE),
        ];
        for (entries, link_table) in lists {
            if let Err(e) = self.link_usages(history_id, entries, link_table).await {
                tracing::warn!(
                    history_id,
                    link_table,
                    error = %e,
                    "history write failed partway; earlier rows remain"
                );
                return Err(e);
            }
        }
        Ok(history_id)
    }

    /// Reads a patient's history: parent row joined with its practitioner
    /// and the three usage lists. The link sets are fetched concurrently.
    pub async fn read(&self, patient_id: i64) -> CoreResult<Value> {
        let rows = self
            .store
            .select(
                tables::PATIENT_HISTORY,
                &Predicate::by("patient_id", patient_id),
            )
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "PatientHistory",
        })?;
        let history_id = get_i64(row, "history_id").unwrap_or_default();

        let by_history = Predicate::by("history_id", history_id);
        let (practitioner_rows, prescription_links, otc_links, recreational_links) =
            futures::try_join!(
                self.practitioner_for(row),
                self.store
                    .select(tables::HISTORY_PRESCRIPTION_USAGE, &by_history),
                self.store.select(tables::HISTORY_OTC_USAGE, &by_history),
                self.store
                    .select(tables::HISTORY_RECREATIONAL_USAGE, &by_history),
            )?;

        let (prescriptions, otc, recreational) = futures::try_join!(
            self.usages_for(&prescription_links),
            self.usages_for(&otc_links),
            self.usages_for(&recreational_links),
        )?;

        let mut document = row.clone();
        document.insert(
            "practitioner".to_string(),
            practitioner_rows
                .into_iter()
                .next()
                .map(Value::Object)
                .unwrap_or(Value::Null),
        );
        document.insert(
            "drugs".to_string(),
            json!({
                "prescriptions": prescriptions,
                "otc": otc,
                "recreational": recreational,
            }),
        );
        Ok(Value::Object(document))
    }

    async fn practitioner_for(&self, history_row: &Row) -> Result<Vec<Row>, StoreError> {
        match get_i64(history_row, "practitioner_id") {
            Some(practitioner_id) => {
                self.store
                    .select(
                        tables::PRACTITIONER,
                        &Predicate::by("practitioner_id", practitioner_id),
                    )
                    .await
            }
            None => Ok(vec![]),
        }
    }

    async fn usages_for(&self, links: &[Row]) -> Result<Vec<Value>, StoreError> {
        let fetches = links
            .iter()
            .filter_map(|link| get_i64(link, "medication_usage_id"))
            .map(|usage_id| {
                let store = self.store.clone();
                async move {
                    store
                        .select(
                            tables::MEDICATION_USAGE,
                            &Predicate::by("medication_usage_id", usage_id),
                        )
                        .await
                }
            });
        let results = futures::future::try_join_all(fetches).await?;
        Ok(results
            .into_iter()
            .filter_map(|rows| rows.into_iter().next())
            .map(Value::Object)
            .collect())
    }

    /// Inserts one usage row plus one association row per entry, in order.
    async fn link_usages(
        &self,
        history_id: i64,
        entries: &[MedicationEntry],
        link_table: &'static str,
    ) -> CoreResult<()> {
        for entry in entries {
            let mut usage = Row::new();
            for (column, value) in [
                ("medication_name", &entry.name),
                ("medication_dose", &entry.dose),
                ("medication_frequency", &entry.freq),
            ] {
                if let Some(value) = value {
                    usage.insert(column.to_string(), value.clone());
                }
            }
            let stored = self.store.insert(tables::MEDICATION_USAGE, usage).await?;
            let usage_id = get_i64(&stored, "medication_usage_id").ok_or_else(|| {
                CoreError::Storage(StoreError::Backend(
                    "usage insert returned no generated id".to_string(),
                ))
            })?;

            let mut link = Row::new();
            link.insert("medication_usage_id".to_string(), usage_id.into());
            link.insert("history_id".to_string(), history_id.into());
            self.store.insert(link_table, link).await?;
        }
        Ok(())
    }
}

/// Flattens the intake into the parent row: nested scalar answers become
/// columns, free-form groups become JSON-string blobs.
fn parent_row(intake: &HistoryIntake) -> Row {
    let mut row = Map::new();

    // Free-form groups, serialised opaquely.
    for (column, value) in [
        ("childhood_illnesses", &intake.health.childhood_illnesses),
        ("immunisations", &intake.health.immunisations),
        ("medical_issues", &intake.health.medical_issues),
        ("surgical_operations", &intake.health.operations),
        ("other_hospitalisations", &intake.health.hospitalisations),
        ("allergies", &intake.medication.allergies),
    ] {
        if let Some(value) = value {
            if let Ok(blob) = serde_json::to_string(value) {
                row.insert(column.to_string(), blob.into());
            }
        }
    }

    // Scalar answers.
    let scalars = [
        ("exercise_frequency", &intake.exercise.frequency),
        ("dieting", &intake.diet.dieting),
        ("difficulties_eating", &intake.diet.difficulties_eating),
        ("drinks_alcohol", &intake.alcohol.does_drink),
        ("alcohol_type", &intake.alcohol.kind),
        ("alcoholic_drinks_weekly", &intake.alcoholfreq),
        ("alcohol_concern", &intake.alcohol.concern),
        (
            "alcohol_consider_stopping",
            &intake.alcohol.consider_stopping,
        ),
        ("tobacco_used_past_5_years", &intake.tobacco.used_prior),
        ("tobacco_last_smoked", &intake.tobacco.last_use),
        ("tobacco_type", &intake.tobacco.type_used),
        ("currently_uses_tobacco", &intake.tobacco.current_use),
        (
            "currently_uses_tobacco_replacement",
            &intake.tobacco.replacement_therapy,
        ),
        (
            "tobacco_replacement_type",
            &intake.tobacco.replacement_types,
        ),
        ("uses_recreational_drugs", &intake.drug.currently_use),
        ("used_recreational_with_needle", &intake.drug.injected),
        ("mental_health_history", &intake.other.mental_health),
        ("social_history", &intake.other.social_history),
        ("family_history", &intake.other.family_history),
        ("relevant_history", &intake.other.relevant_history),
        ("signature_blob", &intake.sign.image),
    ];
    for (column, value) in scalars {
        if let Some(value) = value {
            row.insert(column.to_string(), value.clone());
        }
    }

    if let Some(meals) = &intake.diet.meals_eaten {
        let meals_daily = match meals {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        if let Some(meals_daily) = meals_daily {
            row.insert("meals_daily".to_string(), meals_daily.into());
        }
    }

    if let Some(patient_id) = intake.patient_id {
        row.insert("patient_id".to_string(), patient_id.into());
    }
    if let Some(practitioner_id) = intake.sign.practitioner_id {
        row.insert("practitioner_id".to_string(), practitioner_id.into());
    }
    if let Some(date) = &intake.sign.date {
        let parsed = date
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        match parsed {
            Some(dt) => row.insert(
                "date".to_string(),
                datetime_value(dt.with_timezone(&chrono::Utc)),
            ),
            None => row.insert("date".to_string(), date.clone()),
        };
    }
    if let Some(designation) = &intake.sign.designation {
        row.insert(
            "practitioner_designation".to_string(),
            designation.clone().into(),
        );
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::in_memory_store;

    fn intake_json(designation: Option<&str>, prescriptions: usize) -> Value {
        let prescription: Vec<Value> = (0..prescriptions)
            .map(|i| json!({"name": format!("med-{i}"), "dose": "5mg", "freq": "daily"}))
            .collect();
        let mut sign = json!({
            "practitioner_id": 1,
            "date": "2026-03-01T09:00:00Z",
            "image": "sig-bytes",
        });
        if let Some(designation) = designation {
            sign["designation"] = json!(designation);
        }
        json!({
            "health": {
                "childhood-illnesses": ["measles"],
                "immunisations": ["mmr"],
                "medical-issues": [],
                "operations": [],
                "hispitalisations": [],
            },
            "medication": {
                "allergies": ["penicillin"],
                "prescription": prescription,
                "otc": [],
            },
            "exercise": {"frequency": "weekly"},
            "diet": {"dieting": "no", "difficulties-eating": "no", "meals-eaten": "3"},
            "alcohol": {"does-drink": "yes", "type": "wine", "concern": "no", "consider-stopping": "no"},
            "alcoholfreq": 4,
            "tobacco": {
                "used-prior": "no", "last-use": null, "type-used": null,
                "current-use": "no", "nicotine-replace-therapy": "no",
                "nicotine-replacement-types": null,
            },
            "drug": {"currently-use": "no", "injected": "no", "use-frequency": []},
            "other": {
                "mental-health-wellbeing": "fine", "social-history": "",
                "family-history": "", "relevant-history": "",
            },
            "patient_id": 7,
            "sign": sign,
        })
    }

    async fn count(store: &Arc<dyn Store>, table: &str) -> usize {
        store
            .select(table, &Predicate::all())
            .await
            .expect("select")
            .len()
    }

    #[tokio::test]
    async fn missing_designation_aborts_before_any_write() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let writer = HistoryWriter::new(store.clone());
        let intake = HistoryIntake::parse(intake_json(None, 2)).expect("parse intake");

        let err = writer.write(&intake).await.expect_err("no designation");
        assert!(matches!(err, CoreError::MissingDesignation));

        assert_eq!(count(&store, tables::PATIENT_HISTORY).await, 0);
        assert_eq!(count(&store, tables::MEDICATION_USAGE).await, 0);
        assert_eq!(count(&store, tables::HISTORY_PRESCRIPTION_USAGE).await, 0);
    }

    #[tokio::test]
    async fn two_prescriptions_make_exactly_the_expected_rows() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let writer = HistoryWriter::new(store.clone());
        let intake =
            HistoryIntake::parse(intake_json(Some("Consultant"), 2)).expect("parse intake");

        let history_id = writer.write(&intake).await.expect("write history");
        assert!(history_id > 0);

        assert_eq!(count(&store, tables::PATIENT_HISTORY).await, 1);
        assert_eq!(count(&store, tables::MEDICATION_USAGE).await, 2);
        assert_eq!(count(&store, tables::HISTORY_PRESCRIPTION_USAGE).await, 2);
        assert_eq!(count(&store, tables::HISTORY_OTC_USAGE).await, 0);
        assert_eq!(count(&store, tables::HISTORY_RECREATIONAL_USAGE).await, 0);
    }

    #[tokio::test]
    async fn parent_row_flattens_groups_and_serialises_blobs() {
        let intake = HistoryIntake::parse(intake_json(Some("Consultant"), 0)).expect("parse");
        let row = parent_row(&intake);

        assert_eq!(row.get("childhood_illnesses"), Some(&json!("[\"measles\"]")));
        assert_eq!(row.get("meals_daily"), Some(&json!(3)));
        assert_eq!(row.get("practitioner_designation"), Some(&json!("Consultant")));
        assert_eq!(row.get("patient_id"), Some(&json!(7)));
        // The misspelt legacy key still lands in the canonical column.
        assert_eq!(row.get("other_hospitalisations"), Some(&json!("[]")));
    }

    #[tokio::test]
    async fn read_joins_practitioner_and_usage_lists() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut practitioner = Row::new();
        practitioner.insert("name".to_string(), "Jo Bloggs".into());
        practitioner.insert("username".to_string(), "jo@ward.test".into());
        practitioner.insert("added".to_string(), datetime_value(chrono::Utc::now()));
        store
            .insert(tables::PRACTITIONER, practitioner)
            .await
            .expect("insert practitioner");

        let writer = HistoryWriter::new(store.clone());
        let intake =
            HistoryIntake::parse(intake_json(Some("Consultant"), 2)).expect("parse intake");
        writer.write(&intake).await.expect("write history");

        let document = writer.read(7).await.expect("read history");
        assert_eq!(document["practitioner"]["name"], "Jo Bloggs");
        assert_eq!(
            document["drugs"]["prescriptions"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
        assert_eq!(document["drugs"]["otc"].as_array().map(Vec::len), Some(0));
        assert_eq!(document["drugs"]["prescriptions"][0]["medication_name"], "med-0");
    }

    #[tokio::test]
    async fn read_without_history_is_not_found() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let writer = HistoryWriter::new(store);
        let err = writer.read(99).await.expect_err("no history");
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
