use offeri_core::{
    CatalogStats, CountryCount, DegreeTypeCount, Program, ProgramId, ProgramSummary,
    UniversityCount,
};
use rusqlite::{params_from_iter, Result, Row};
use std::collections::HashMap;

use super::CatalogStorage;

/// Row to load into the catalog.
#[derive(Debug, Clone, Default)]
pub struct NewProgram {
    pub program_id: ProgramId,
    pub program_name: String,
    pub university_name: String,
    pub country: String,
    pub city: Option<String>,
    pub degree_type: Option<String>,
    pub duration_months: Option<u32>,
    pub study_mode: Option<String>,
    pub tuition_min: Option<i64>,
    pub tuition_max: Option<i64>,
    pub description: Option<String>,
    pub classifications: Vec<String>,
}

const TOP_COUNTRIES: usize = 15;
const TOP_UNIVERSITIES: usize = 20;

impl CatalogStorage {
    pub fn insert_program(&self, program: &NewProgram) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO programs (program_id, program_name, university_name, country_standardized, city, degree_type, duration_months, study_mode, tuition_min, tuition_max, description) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            (
                program.program_id,
                &program.program_name,
                &program.university_name,
                &program.country,
                &program.city,
                &program.degree_type,
                program.duration_months,
                &program.study_mode,
                program.tuition_min,
                program.tuition_max,
                &program.description,
            ),
        )?;
        tx.execute(
            "DELETE FROM program_classifications WHERE program_id = ?1",
            [program.program_id],
        )?;
        for classification in &program.classifications {
            tx.execute(
                "INSERT OR IGNORE INTO program_classifications (program_id, classification) VALUES (?1, ?2)",
                (program.program_id, classification),
            )?;
        }
        tx.commit()
    }

    pub fn program_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM programs", [], |row| row.get(0))
    }

    pub fn available_countries(&self) -> Result<Vec<CountryCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT country_standardized, COUNT(*) AS count
             FROM programs
             WHERE country_standardized IS NOT NULL
             GROUP BY country_standardized
             ORDER BY count DESC, country_standardized",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CountryCount {
                country: row.get(0)?,
                program_count: row.get(1)?,
            })
        })?;
        rows.collect()
    }

    /// Exact country match, universities with the most programs first.
    pub fn universities_in(&self, country: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT university_name
             FROM programs
             WHERE country_standardized = ?1
             GROUP BY university_name
             ORDER BY COUNT(*) DESC, university_name",
        )?;
        let rows = stmt.query_map([country], |row| row.get(0))?;
        rows.collect()
    }

    /// Programs at one university carrying any of `classifications`; all of them when empty.
    pub fn programs_for(
        &self,
        university: &str,
        classifications: &[String],
    ) -> Result<Vec<ProgramSummary>> {
        let mut sql = String::from(
            "SELECT program_id, program_name, degree_type FROM programs WHERE university_name = ?1",
        );
        if !classifications.is_empty() {
            let placeholders: Vec<String> = (0..classifications.len())
                .map(|i| format!("?{}", i + 2))
                .collect();
            sql.push_str(&format!(
                " AND program_id IN (SELECT program_id FROM program_classifications WHERE classification IN ({}))",
                placeholders.join(", ")
            ));
        }
        sql.push_str(" ORDER BY program_name, program_id");

        let params = std::iter::once(university.to_string()).chain(classifications.iter().cloned());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), map_summary_row)?;
        rows.collect()
    }

    /// Full records for `ids`, in ascending id order. Unknown ids are skipped.
    pub fn program_details(&self, ids: &[ProgramId]) -> Result<Vec<Program>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");

        let mut stmt = self.conn.prepare(&format!(
            "SELECT program_id, program_name, university_name, country_standardized, city, degree_type, duration_months, study_mode
             FROM programs WHERE program_id IN ({}) ORDER BY program_id",
            placeholders
        ))?;
        let mut programs: Vec<Program> = stmt
            .query_map(params_from_iter(ids.iter()), map_program_row)?
            .collect::<Result<_>>()?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT program_id, classification FROM program_classifications
             WHERE program_id IN ({}) ORDER BY classification",
            placeholders
        ))?;
        let mut tags: HashMap<ProgramId, Vec<String>> = HashMap::new();
        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, ProgramId>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (id, classification) = row?;
            tags.entry(id).or_default().push(classification);
        }

        for program in &mut programs {
            program.classifications = tags.remove(&program.program_id).unwrap_or_default();
        }
        Ok(programs)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        let (total_programs, with_duration, with_degree_type) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN duration_months IS NOT NULL THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN degree_type IS NOT NULL THEN 1 ELSE 0 END), 0)
             FROM programs",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut top_countries = self.available_countries()?;
        top_countries.truncate(TOP_COUNTRIES);

        let mut stmt = self.conn.prepare(
            "SELECT university_name, COALESCE(MAX(country_standardized), ''), COUNT(*) AS program_count
             FROM programs
             GROUP BY university_name
             ORDER BY program_count DESC, university_name
             LIMIT ?1",
        )?;
        let top_universities = stmt
            .query_map([TOP_UNIVERSITIES as i64], |row| {
                Ok(UniversityCount {
                    university: row.get(0)?,
                    country: row.get(1)?,
                    programs: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT degree_type, COUNT(*) AS count
             FROM programs
             WHERE degree_type IS NOT NULL
             GROUP BY degree_type
             ORDER BY count DESC, degree_type",
        )?;
        let degree_types = stmt
            .query_map([], |row| {
                Ok(DegreeTypeCount {
                    degree_type: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(CatalogStats {
            total_programs,
            with_duration,
            with_degree_type,
            top_countries,
            top_universities,
            degree_types,
        })
    }
}

fn map_summary_row(row: &Row<'_>) -> Result<ProgramSummary> {
    Ok(ProgramSummary {
        program_id: row.get(0)?,
        program_name: row.get(1)?,
        degree_type: row.get(2)?,
    })
}

fn map_program_row(row: &Row<'_>) -> Result<Program> {
    let study_mode: Option<String> = row.get(7)?;
    Ok(Program {
        program_id: row.get(0)?,
        program_name: row.get(1)?,
        university_name: row.get(2)?,
        country: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        city: row.get(4)?,
        degree_type: row.get(5)?,
        duration_months: row.get(6)?,
        is_part_time: Program::part_time_from_study_mode(study_mode.as_deref()),
        classifications: Vec::new(),
    })
}
