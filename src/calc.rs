use std::cmp::Ordering;

use serde::Serialize;

use crate::store::{Course, Student};

/// Credit-weighted average score. `None` when no credit has been earned
/// yet (empty course list or all credits zero); never divides by zero.
pub fn gpa(courses: &[Course]) -> Option<f64> {
    let mut weighted = 0.0;
    let mut credits = 0.0;
    for c in courses {
        weighted += c.score * c.credit;
        credits += c.credit;
    }
    if credits > 0.0 {
        Some(weighted / credits)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub gpa: Option<f64>,
}

/// Ranks the whole collection by GPA, descending. Students without a GPA
/// sort below every student with one, including a GPA of exactly 0. The
/// sort is stable, so exact ties keep their collection order. Positions
/// are 1-based and never shared.
pub fn rank(students: &[Student]) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = students
        .iter()
        .map(|s| RankEntry {
            rank: 0,
            id: s.id.clone(),
            name: s.name.clone().unwrap_or_default(),
            gpa: gpa(&s.courses),
        })
        .collect();

    entries.sort_by(|a, b| match (a.gpa, b.gpa) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i + 1;
    }
    entries
}
