//! Bounded-fanout path queries, one structural pattern per hop class.
//!
//! Each query starts from a single `Disease` seed and returns at most
//! `limit` rows. Optional matches are expressed as `LEFT JOIN`s so their
//! columns come back `NULL` when the pattern is missing; a multi-edge
//! optional path is joined as one derived table so it binds all-or-nothing.

use rusqlite::{params, Connection};

use crate::errors::CorpusResult;
use crate::models::{fields, HopClass, PathRecord};
use crate::query::guards::clamp_limit;

/// `disease` plus optional direct symptom, treating drug and group. The three
/// optional matches combine as a cross product.
const ONE_HOP_SQL: &str = "\
SELECT d.name, d.description, s.name, dr.name, dr.description, g.name, g.description
FROM nodes d
LEFT JOIN edges hs
    ON hs.source_label = 'Disease' AND hs.source_id = d.node_id
   AND hs.relationship = 'HAS_SYMPTOM' AND hs.target_label = 'Symptom'
LEFT JOIN nodes s ON s.label = 'Symptom' AND s.node_id = hs.target_id
LEFT JOIN edges tr
    ON tr.target_label = 'Disease' AND tr.target_id = d.node_id
   AND tr.relationship = 'TREATS' AND tr.source_label = 'Drug'
LEFT JOIN nodes dr ON dr.label = 'Drug' AND dr.node_id = tr.source_id
LEFT JOIN edges bt
    ON bt.source_label = 'Disease' AND bt.source_id = d.node_id
   AND bt.relationship = 'BELONGS_TO' AND bt.target_label = 'Group'
LEFT JOIN nodes g ON g.label = 'Group' AND g.node_id = bt.target_id
WHERE d.label = 'Disease' AND d.node_id = ?1
LIMIT ?2;";

const ONE_HOP_FIELDS: &[&str] = &[
    fields::DISEASE,
    fields::DISEASE_DESC,
    fields::SYMPTOM,
    fields::DRUG,
    fields::DRUG_DESC,
    fields::GROUP_NAME,
    fields::GROUP_DESC,
];

/// `drug -> disease -> symptom` and `sub-disease -> disease -> group`, each
/// optional, keeping rows where at least one of the two paths matched.
const TWO_HOP_SQL: &str = "\
SELECT d.name, d.description, p1.drug, p1.drug_desc, p1.symptom,
       p2.sub_disease, p2.sub_desc, p2.group_name
FROM nodes d
LEFT JOIN (
    SELECT dr.name AS drug, dr.description AS drug_desc, s.name AS symptom
    FROM edges tr
    JOIN nodes dr ON dr.label = 'Drug' AND dr.node_id = tr.source_id
    JOIN edges hs
        ON hs.source_label = 'Disease' AND hs.source_id = tr.target_id
       AND hs.relationship = 'HAS_SYMPTOM' AND hs.target_label = 'Symptom'
    JOIN nodes s ON s.label = 'Symptom' AND s.node_id = hs.target_id
    WHERE tr.source_label = 'Drug' AND tr.relationship = 'TREATS'
      AND tr.target_label = 'Disease' AND tr.target_id = ?1
) p1 ON 1 = 1
LEFT JOIN (
    SELECT sub.name AS sub_disease, sub.description AS sub_desc, g.name AS group_name
    FROM edges isa
    JOIN nodes sub ON sub.label = 'Disease' AND sub.node_id = isa.source_id
    JOIN edges bt
        ON bt.source_label = 'Disease' AND bt.source_id = isa.target_id
       AND bt.relationship = 'BELONGS_TO' AND bt.target_label = 'Group'
    JOIN nodes g ON g.label = 'Group' AND g.node_id = bt.target_id
    WHERE isa.source_label = 'Disease' AND isa.relationship = 'IS_A'
      AND isa.target_label = 'Disease' AND isa.target_id = ?1
) p2 ON 1 = 1
WHERE d.label = 'Disease' AND d.node_id = ?1
  AND (p1.drug IS NOT NULL OR p2.sub_disease IS NOT NULL)
LIMIT ?2;";

const TWO_HOP_FIELDS: &[&str] = &[
    fields::DISEASE,
    fields::DISEASE_DESC,
    fields::DRUG,
    fields::DRUG_DESC,
    fields::SYMPTOM,
    fields::SUB_DISEASE,
    fields::SUB_DESC,
    fields::GROUP_NAME,
];

/// Mandatory `drug -> disease -> group -> chapter` chain.
const THREE_HOP_SQL: &str = "\
SELECT d.name, dr.name, g.name, g.description, c.name, c.description
FROM nodes d
JOIN edges tr
    ON tr.target_label = 'Disease' AND tr.target_id = d.node_id
   AND tr.relationship = 'TREATS' AND tr.source_label = 'Drug'
JOIN nodes dr ON dr.label = 'Drug' AND dr.node_id = tr.source_id
JOIN edges bt
    ON bt.source_label = 'Disease' AND bt.source_id = d.node_id
   AND bt.relationship = 'BELONGS_TO' AND bt.target_label = 'Group'
JOIN nodes g ON g.label = 'Group' AND g.node_id = bt.target_id
JOIN edges bc
    ON bc.source_label = 'Group' AND bc.source_id = g.node_id
   AND bc.relationship = 'BELONGS_TO' AND bc.target_label = 'Chapter'
JOIN nodes c ON c.label = 'Chapter' AND c.node_id = bc.target_id
WHERE d.label = 'Disease' AND d.node_id = ?1
LIMIT ?2;";

const THREE_HOP_FIELDS: &[&str] = &[
    fields::DISEASE,
    fields::DRUG,
    fields::GROUP_NAME,
    fields::GROUP_DESC,
    fields::CHAPTER_NAME,
    fields::CHAPTER_DESC,
];

/// SQL text and output field names for a hop class.
pub fn hop_query(hop: HopClass) -> (&'static str, &'static [&'static str]) {
    match hop {
        HopClass::OneHop => (ONE_HOP_SQL, ONE_HOP_FIELDS),
        HopClass::TwoHop => (TWO_HOP_SQL, TWO_HOP_FIELDS),
        HopClass::ThreeHop => (THREE_HOP_SQL, THREE_HOP_FIELDS),
    }
}

/// Run the `hop` pattern for one seed, returning at most `limit` records
/// (clamped to the guard ceiling).
pub fn run_hop_query(
    conn: &Connection,
    hop: HopClass,
    seed_id: &str,
    limit: usize,
) -> CorpusResult<Vec<PathRecord>> {
    let (sql, names) = hop_query(hop);
    let limit = clamp_limit(limit) as i64;
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params![seed_id, limit], |row| {
        let mut record = PathRecord::new();
        for (i, name) in names.iter().enumerate() {
            record.insert(name, row.get::<_, Option<String>>(i)?);
        }
        Ok(record)
    })?;

    let mut records = Vec::new();
    for record in rows {
        records.push(record?);
    }
    Ok(records)
}
