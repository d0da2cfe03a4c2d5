use serde::Deserialize;

use crate::error::{Error, Result};
use crate::store::{Course, Student};

/// Payload for `students.create`. Matches the persisted record shape, but
/// any courses supplied here are discarded: course data enters only through
/// the score upsert path. Unknown keys are rejected at this boundary.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentInput {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub classnum: Option<String>,
    #[serde(default)]
    pub plcstatus: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub parphone: Option<String>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// Partial update for `students.update`: only supplied fields are written,
/// the course list is never touched through this path.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub classnum: Option<String>,
    #[serde(default)]
    pub plcstatus: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub parphone: Option<String>,
}

/// Appends a new record with an empty course list. The collection keeps at
/// most one record per id.
pub fn create(students: &mut Vec<Student>, input: StudentInput) -> Result<()> {
    if students.iter().any(|s| s.id == input.id) {
        return Err(Error::DuplicateKey { id: input.id });
    }
    students.push(Student {
        id: input.id,
        name: input.name,
        gender: input.gender,
        age: input.age,
        college: input.college,
        classnum: input.classnum,
        plcstatus: input.plcstatus,
        phone: input.phone,
        province: input.province,
        parphone: input.parphone,
        courses: Vec::new(),
    });
    Ok(())
}

pub fn apply_update(students: &mut [Student], id: &str, patch: StudentPatch) -> Result<()> {
    let Some(s) = students.iter_mut().find(|s| s.id == id) else {
        return Err(Error::NotFound {
            what: "student",
            key: id.to_string(),
        });
    };

    if patch.name.is_some() {
        s.name = patch.name;
    }
    if patch.gender.is_some() {
        s.gender = patch.gender;
    }
    if patch.age.is_some() {
        s.age = patch.age;
    }
    if patch.college.is_some() {
        s.college = patch.college;
    }
    if patch.classnum.is_some() {
        s.classnum = patch.classnum;
    }
    if patch.plcstatus.is_some() {
        s.plcstatus = patch.plcstatus;
    }
    if patch.phone.is_some() {
        s.phone = patch.phone;
    }
    if patch.province.is_some() {
        s.province = patch.province;
    }
    if patch.parphone.is_some() {
        s.parphone = patch.parphone;
    }
    Ok(())
}

/// Removes the record and, with it, every course it owns.
pub fn remove(students: &mut Vec<Student>, id: &str) -> Result<()> {
    let before = students.len();
    students.retain(|s| s.id != id);
    if students.len() == before {
        return Err(Error::NotFound {
            what: "student",
            key: id.to_string(),
        });
    }
    Ok(())
}

/// Single-record score upsert: `NotFound` when the id is absent from the
/// collection, otherwise the same semantics as the import pipeline.
pub fn upsert_score(
    students: &mut [Student],
    id: &str,
    course: &str,
    credit: f64,
    score: f64,
) -> Result<()> {
    if upsert_score_in_memory(students, id, course, credit, score) {
        Ok(())
    } else {
        Err(Error::NotFound {
            what: "student",
            key: id.to_string(),
        })
    }
}

/// Upsert-by-course-name against one in-memory collection. A second write
/// to the same (id, course) pair overwrites credit and score in place; a
/// new course name is appended. Returns false when no record has that id,
/// leaving the collection untouched.
pub fn upsert_score_in_memory(
    students: &mut [Student],
    id: &str,
    course: &str,
    credit: f64,
    score: f64,
) -> bool {
    let Some(s) = students.iter_mut().find(|s| s.id == id) else {
        return false;
    };
    if let Some(c) = s.courses.iter_mut().find(|c| c.name == course) {
        c.credit = credit;
        c.score = score;
    } else {
        s.courses.push(Course {
            name: course.to_string(),
            credit,
            score,
        });
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str) -> StudentInput {
        StudentInput {
            id: id.to_string(),
            name: Some("Test".to_string()),
            gender: None,
            age: None,
            college: None,
            classnum: None,
            plcstatus: None,
            phone: None,
            province: None,
            parphone: None,
            courses: Vec::new(),
        }
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let mut students = Vec::new();
        create(&mut students, input("S1")).expect("first create");
        let err = create(&mut students, input("S1")).expect_err("duplicate");
        assert_eq!(err.code(), "duplicate_id");
        assert_eq!(students.len(), 1);
    }

    #[test]
    fn create_discards_supplied_courses() {
        let mut students = Vec::new();
        let mut inp = input("S1");
        inp.courses.push(Course {
            name: "Smuggled".to_string(),
            credit: 1.0,
            score: 100.0,
        });
        create(&mut students, inp).expect("create");
        assert!(students[0].courses.is_empty());
    }

    #[test]
    fn create_then_delete_restores_collection() {
        let mut students = Vec::new();
        create(&mut students, input("S1")).expect("create s1");
        let snapshot = students.clone();

        create(&mut students, input("S2")).expect("create s2");
        remove(&mut students, "S2").expect("delete s2");
        assert_eq!(students, snapshot);
    }

    #[test]
    fn update_overwrites_only_supplied_fields() {
        let mut students = Vec::new();
        create(&mut students, input("S1")).expect("create");
        upsert_score(&mut students, "S1", "Math", 3.0, 90.0).expect("score");

        let patch = StudentPatch {
            college: Some("Physics".to_string()),
            ..StudentPatch::default()
        };
        apply_update(&mut students, "S1", patch).expect("update");

        assert_eq!(students[0].name.as_deref(), Some("Test"));
        assert_eq!(students[0].college.as_deref(), Some("Physics"));
        assert_eq!(students[0].courses.len(), 1);
    }

    #[test]
    fn update_and_delete_miss_unknown_id() {
        let mut students = Vec::new();
        create(&mut students, input("S1")).expect("create");

        let err = apply_update(&mut students, "S9", StudentPatch::default());
        assert_eq!(err.expect_err("missing").code(), "not_found");
        let err = remove(&mut students, "S9");
        assert_eq!(err.expect_err("missing").code(), "not_found");
        assert_eq!(students.len(), 1);
    }

    #[test]
    fn upsert_twice_keeps_one_course_with_latest_values() {
        let mut students = Vec::new();
        create(&mut students, input("S1")).expect("create");

        upsert_score(&mut students, "S1", "Math", 3.0, 90.0).expect("first");
        upsert_score(&mut students, "S1", "Math", 3.0, 95.0).expect("second");

        assert_eq!(students[0].courses.len(), 1);
        assert_eq!(students[0].courses[0].score, 95.0);
        assert_eq!(students[0].courses[0].credit, 3.0);
    }

    #[test]
    fn upsert_preserves_insertion_order_of_courses() {
        let mut students = Vec::new();
        create(&mut students, input("S1")).expect("create");
        upsert_score(&mut students, "S1", "Math", 3.0, 90.0).expect("math");
        upsert_score(&mut students, "S1", "Art", 1.0, 80.0).expect("art");
        upsert_score(&mut students, "S1", "Math", 2.0, 70.0).expect("math again");

        let names: Vec<&str> = students[0].courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Math", "Art"]);
    }
}
