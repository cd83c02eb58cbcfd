//! Bulk import of the ingredient reference data from a CSV or JSON fixture.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{QueryError, TypeError},
    schema::IngredientRecord,
    validation::validate_ingredient,
};

const INSERT_CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    Csv,
    Json,
}

impl FixtureFormat {
    pub fn from_path(path: &Path) -> Result<Self, TypeError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(TypeError::new(&format!(
                "Unsupported fixture {}, expected a .csv or .json file",
                path.display()
            ))),
        }
    }
}

fn check_record(record: &IngredientRecord, position: &str) -> Result<(), TypeError> {
    validate_ingredient(record).map_err(|e| {
        log::error!("Malformed fixture row at {position}: {e}");
        TypeError::new(&format!("{position}: {e}"))
    })
}

fn is_header(record: &StringRecord) -> bool {
    record.len() == 2
        && record[0].eq_ignore_ascii_case("name")
        && record[1].eq_ignore_ascii_case("measurement_unit")
}

fn parse_csv(content: &str) -> Result<Vec<IngredientRecord>, TypeError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();

    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            log::error!("Malformed ingredient fixture: {e}");
            TypeError::new(&format!("Malformed ingredient fixture: {e}"))
        })?;
        let position = format!(
            "line {}",
            row.position().map(|p| p.line()).unwrap_or_default()
        );

        if index == 0 && is_header(&row) {
            continue;
        }
        if row.len() != 2 {
            log::error!(
                "Malformed fixture row at {position}: expected 2 fields, found {}",
                row.len()
            );
            return Err(TypeError::new(&format!(
                "{position}: expected name,measurement_unit"
            )));
        }

        let record = IngredientRecord {
            name: row[0].to_owned(),
            measurement_unit: row[1].to_owned(),
        };
        check_record(&record, &position)?;
        records.push(record);
    }

    Ok(records)
}

fn parse_json(content: &str) -> Result<Vec<IngredientRecord>, TypeError> {
    let records: Vec<IngredientRecord> = serde_json::from_str(content).map_err(|e| {
        log::error!("Malformed ingredient fixture: {e}");
        TypeError::new(&format!("Malformed ingredient fixture: {e}"))
    })?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| -> Result<IngredientRecord, TypeError> {
            check_record(&record, &format!("index {index}"))?;
            Ok(IngredientRecord {
                name: record.name.trim().to_owned(),
                measurement_unit: record.measurement_unit.trim().to_owned(),
            })
        })
        .collect()
}

/// Parses a whole fixture. Any malformed row fails the parse, so nothing is
/// written for a partially valid file.
pub fn parse_fixture(
    content: &str,
    format: FixtureFormat,
) -> Result<Vec<IngredientRecord>, TypeError> {
    match format {
        FixtureFormat::Csv => parse_csv(content),
        FixtureFormat::Json => parse_json(content),
    }
}

/// Inserts the records in one transaction, skipping (name, unit) pairs that
/// already exist. Returns the number of new rows.
pub async fn import_ingredients(
    records: &[IngredientRecord],
    pool: &Pool<Postgres>,
) -> Result<u64, potion::Error> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let mut inserted = 0;
    for chunk in records.chunks(INSERT_CHUNK_SIZE) {
        let mut query = QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");
        query.push_values(chunk, |mut b, record| {
            b.push_bind(record.name.as_str())
                .push_bind(record.measurement_unit.as_str());
        });
        query.push(" ON CONFLICT (name, measurement_unit) DO NOTHING");

        let result = query
            .build()
            .execute(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
        inserted += result.rows_affected();
    }

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(inserted)
}

/// Reads, parses and imports the fixture at `path`.
pub async fn import_fixture(path: &Path, pool: &Pool<Postgres>) -> Result<u64, potion::Error> {
    let format = FixtureFormat::from_path(path).map_err(|e| e.into())?;
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        TypeError::new(&format!("Could not read {}: {e}", path.display())).into()
    })?;

    let records = parse_fixture(&content, format).map_err(|e| e.into())?;
    let inserted = import_ingredients(&records, pool).await?;

    log::info!(
        "Imported {} of {} ingredients from {}",
        inserted,
        records.len(),
        path.display()
    );
    Ok(inserted)
}
