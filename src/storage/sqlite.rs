//! SQLite database layer

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, ErrorCode as SqliteErrorCode, Row, params};
use serde::Serialize;

use crate::error::{CvmError, Result};
use crate::ingest::ParsedResume;
use crate::search::RankedCandidate;
use crate::storage::CandidateLookup;
use crate::storage::migrations;

/// SQLite database wrapper for the candidate store
pub struct Database {
    conn: Connection,
    schema_version: u32,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

/// Row shown in candidate search listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSummary {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub experience_years: i64,
    pub category: Option<String>,
    pub skills: Vec<String>,
}

/// Full candidate profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateDetails {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub education: Option<String>,
    pub experience_years: i64,
    pub category: Option<String>,
    pub full_text: Option<String>,
    pub skills: Vec<String>,
    pub created_at: String,
}

/// Aggregate statistics over the candidate store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseStats {
    pub total_candidates: i64,
    pub total_skills: i64,
    pub avg_experience_years: f64,
    /// `(category, count)`, most common first.
    pub categories: Vec<(String, i64)>,
    /// `(skill, candidates)`, top 20.
    pub top_skills: Vec<(String, i64)>,
    /// `(years, candidates)`, ascending years.
    pub experience_distribution: Vec<(i64, i64)>,
}

const TOP_SKILLS_LIMIT: i64 = 20;

impl Database {
    /// Open database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        Self::configure_pragmas(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// Get a reference to the connection
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Current schema version after migrations.
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    // =========================================================================
    // Candidates
    // =========================================================================

    /// Insert a parsed résumé and link its skills. Returns the new id.
    ///
    /// A second candidate with an already stored email fails with
    /// [`CvmError::DuplicateCandidate`] and leaves no partial rows behind.
    pub fn insert_candidate(&self, resume: &ParsedResume) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT INTO candidates (name, email, phone, education, experience_years, category, full_text)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                resume.name,
                resume.email,
                resume.phone,
                resume.education,
                resume.experience_years,
                resume.category,
                resume.full_text,
            ],
        );
        if let Err(err) = inserted {
            return Err(match err.sqlite_error_code() {
                Some(SqliteErrorCode::ConstraintViolation) => CvmError::DuplicateCandidate(
                    resume
                        .email
                        .clone()
                        .unwrap_or_else(|| resume.name.clone()),
                ),
                _ => CvmError::Database(err),
            });
        }
        let candidate_id = tx.last_insert_rowid();

        for skill in &resume.skills {
            tx.execute(
                "INSERT OR IGNORE INTO skills (skill_name) VALUES (?)",
                [skill],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO candidate_skills (candidate_id, skill_id)
                 SELECT ?, id FROM skills WHERE skill_name = ?",
                params![candidate_id, skill],
            )?;
        }

        tx.commit()?;
        Ok(candidate_id)
    }

    pub fn count_candidates(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
        Ok(count)
    }

    /// `(id, full_text)` for every candidate with stored text, ascending id.
    pub fn all_candidate_texts(&self) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, full_text FROM candidates WHERE full_text IS NOT NULL ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn candidate_details(&self, id: i64) -> Result<Option<CandidateDetails>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.email, c.phone, c.education, c.experience_years,
                    c.category, c.full_text, c.created_at,
                    GROUP_CONCAT(DISTINCT s.skill_name)
             FROM candidates c
             LEFT JOIN candidate_skills cs ON c.id = cs.candidate_id
             LEFT JOIN skills s ON cs.skill_id = s.id
             WHERE c.id = ?
             GROUP BY c.id",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(details_from_row(row)?));
        }
        Ok(None)
    }

    /// Name or skill `LIKE` search, optionally restricted to one category.
    ///
    /// With neither filter this lists the first `limit` candidates.
    pub fn search_candidates(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CandidateSummary>> {
        let pattern = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{q}%"));

        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.email, c.experience_years, c.category,
                    GROUP_CONCAT(DISTINCT s.skill_name)
             FROM candidates c
             LEFT JOIN candidate_skills cs ON c.id = cs.candidate_id
             LEFT JOIN skills s ON cs.skill_id = s.id
             WHERE (?1 IS NULL
                    OR c.name LIKE ?1
                    OR EXISTS (
                        SELECT 1 FROM candidate_skills cs2
                        JOIN skills s2 ON cs2.skill_id = s2.id
                        WHERE cs2.candidate_id = c.id AND s2.skill_name LIKE ?1))
               AND (?2 IS NULL OR c.category = ?2)
             GROUP BY c.id
             ORDER BY c.id
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![pattern, category, limit as i64], summary_from_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn stats(&self) -> Result<DatabaseStats> {
        let total_candidates = self.count_candidates()?;
        let total_skills: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM skills", [], |row| row.get(0))?;
        let avg_experience_years: Option<f64> = self.conn.query_row(
            "SELECT AVG(experience_years) FROM candidates",
            [],
            |row| row.get(0),
        )?;

        let categories = self.collect_pairs(
            "SELECT category, COUNT(*) AS count FROM candidates
             WHERE category IS NOT NULL
             GROUP BY category ORDER BY count DESC, category",
            params![],
        )?;
        let top_skills = self.collect_pairs(
            "SELECT s.skill_name, COUNT(*) AS count FROM skills s
             JOIN candidate_skills cs ON s.id = cs.skill_id
             GROUP BY s.skill_name ORDER BY count DESC, s.skill_name LIMIT ?",
            [TOP_SKILLS_LIMIT],
        )?;
        let experience_distribution = self.collect_pairs(
            "SELECT experience_years, COUNT(*) FROM candidates
             GROUP BY experience_years ORDER BY experience_years",
            params![],
        )?;

        Ok(DatabaseStats {
            total_candidates,
            total_skills,
            avg_experience_years: avg_experience_years.unwrap_or(0.0),
            categories,
            top_skills,
            experience_distribution,
        })
    }

    fn collect_pairs<K, P>(&self, sql: &str, params: P) -> Result<Vec<(K, i64)>>
    where
        K: rusqlite::types::FromSql,
        P: rusqlite::Params,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    // =========================================================================
    // Job descriptions and match audit log
    // =========================================================================

    pub fn insert_job_description(
        &self,
        title: &str,
        description: &str,
        required_skills: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO job_descriptions (title, description, required_skills) VALUES (?, ?, ?)",
            params![title, description, required_skills],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Append ranking results for `job_id` to `matching_results`.
    pub fn record_match_results(&self, job_id: i64, results: &[RankedCandidate]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO matching_results
                 (candidate_id, job_id, semantic_score, keyword_score, combined_score)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            for result in results {
                stmt.execute(params![
                    result.candidate_id,
                    job_id,
                    f64::from(result.semantic_score),
                    result.keyword_score.map(f64::from),
                    f64::from(result.combined_score),
                ])?;
            }
        }
        tx.commit()?;
        Ok(results.len())
    }

    pub fn count_match_results(&self, job_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM matching_results WHERE job_id = ?",
            [job_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }
}

impl CandidateLookup for Database {
    fn candidate_names(&self) -> Result<BTreeMap<i64, String>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM candidates")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut names = BTreeMap::new();
        for row in rows {
            let (id, name) = row?;
            names.insert(id, name);
        }
        Ok(names)
    }

    fn full_text(&self, candidate_id: i64) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT full_text FROM candidates WHERE id = ?")?;
        let mut rows = stmt.query([candidate_id])?;
        if let Some(row) = rows.next()? {
            return Ok(row.get(0)?);
        }
        Ok(None)
    }
}

fn split_skills(joined: Option<String>) -> Vec<String> {
    joined
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|skill| !skill.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<CandidateSummary> {
    Ok(CandidateSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        experience_years: row.get(3)?,
        category: row.get(4)?,
        skills: split_skills(row.get(5)?),
    })
}

fn details_from_row(row: &Row<'_>) -> rusqlite::Result<CandidateDetails> {
    Ok(CandidateDetails {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        education: row.get(4)?,
        experience_years: row.get(5)?,
        category: row.get(6)?,
        full_text: row.get(7)?,
        created_at: row.get(8)?,
        skills: split_skills(row.get(9)?),
    })
}
