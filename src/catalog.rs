//! Declarative registry of content partitions.
//!
//! Each family (courses, devoirs, ...) is split into physically separate
//! collections, one per education level and grade. The table below is the
//! single source of truth for that split; [`Catalog`] indexes it once at
//! startup and resolves the three addressing schemes clients use (canonical
//! model name, `(level, grade)` pair, legacy `type` key).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Family {
    Course,
    Devoir,
    Exam,
    ExamBlanc,
    Book,
    PageDescription,
}

impl Family {
    pub const ALL: [Family; 6] = [
        Family::Course,
        Family::Devoir,
        Family::Exam,
        Family::ExamBlanc,
        Family::Book,
        Family::PageDescription,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Devoir => "devoir",
            Self::Exam => "exam",
            Self::ExamBlanc => "exam_blanc",
            Self::Book => "book",
            Self::PageDescription => "page_description",
        }
    }

    /// Human-readable name used in response messages.
    pub fn entity_name(self) -> &'static str {
        match self {
            Self::Course => "Course",
            Self::Devoir => "Devoir",
            Self::Exam => "Exam",
            Self::ExamBlanc => "Exam Blanc",
            Self::Book => "Book",
            Self::PageDescription => "Page description",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    College,
    Lycee,
    CommonCore,
    General,
}

impl Level {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "college" => Some(Self::College),
            "lycee" => Some(Self::Lycee),
            "common_core" => Some(Self::CommonCore),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::College => "college",
            Self::Lycee => "lycee",
            Self::CommonCore => "common_core",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    pub family: Family,
    /// Canonical flattened name, e.g. `FirstCollegeCourse`.
    pub model: &'static str,
    /// Physical collection the records live in.
    pub collection: &'static str,
    pub level: Level,
    pub grade: &'static str,
    /// Short key accepted by the older `type=` addressing.
    pub type_key: Option<&'static str>,
}

const fn p(
    family: Family,
    model: &'static str,
    collection: &'static str,
    level: Level,
    grade: &'static str,
    type_key: Option<&'static str>,
) -> Partition {
    Partition {
        family,
        model,
        collection,
        level,
        grade,
        type_key,
    }
}

use Family::{Book, Course, Devoir, Exam, ExamBlanc, PageDescription};
use Level::{College, CommonCore, General, Lycee};

pub static PARTITIONS: &[Partition] = &[
    // Courses
    p(Course, "FirstCollegeCourse", "first_college_courses", College, "1", Some("1college")),
    p(Course, "SecondCollegeCourse", "second_college_courses", College, "2", Some("2college")),
    p(Course, "ThirdCollegeCourse", "third_college_courses", College, "3", Some("3college")),
    p(Course, "FirstBacMathCourse", "first_bac_math_courses", Lycee, "1bac_math", Some("math")),
    p(Course, "FirstBacScienceCourse", "first_bac_science_courses", Lycee, "1bac_science", Some("science")),
    p(Course, "FirstBacEconomicsCourse", "first_bac_economics_courses", Lycee, "1bac_economics", Some("economics")),
    p(Course, "FirstBacLettersCourse", "first_bac_letters_courses", Lycee, "1bac_letters", Some("letters")),
    p(Course, "SecondBacMathACourse", "second_bac_math_a_courses", Lycee, "2bac_math_a", Some("2bac_math_a")),
    p(Course, "SecondBacMathBCourse", "second_bac_math_b_courses", Lycee, "2bac_math_b", Some("2bac_math_b")),
    p(Course, "SecondBacEconomicsCourse", "second_bac_economics_courses", Lycee, "2bac_economics", Some("2bac_economics")),
    p(Course, "SecondBacLettersCourse", "second_bac_letters_courses", Lycee, "2bac_letters", Some("2bac_letters")),
    p(Course, "SecondBacPhysicsChemistryLifeSciencesCourse", "second_bac_pcsvt_courses", Lycee, "2bac_pcsvt", Some("2bac_pcsvt")),
    p(Course, "SecondBacTechnicalCommonCourse", "second_bac_tct_courses", Lycee, "2bac_tct", Some("2bac_tct")),
    p(Course, "CommonCoreCourse", "common_core_courses", CommonCore, "common_core", Some("common_core")),
    p(Course, "CommonCoreLettersCourse", "common_core_letters_courses", CommonCore, "common_core_letters", Some("common_core_letters")),
    p(Course, "CommonCoreScienceCourse", "common_core_science_courses", CommonCore, "common_core_science", Some("common_core_science")),
    p(Course, "CommonCoreTechnicalCourse", "common_core_technical_courses", CommonCore, "common_core_technical", Some("common_core_technical")),
    p(Course, "Course", "courses", General, "general", None),
    // Devoirs
    p(Devoir, "FirstCollegeDevoir", "first_college_devoirs", College, "1", Some("1college")),
    p(Devoir, "SecondCollegeDevoir", "second_college_devoirs", College, "2", Some("2college")),
    p(Devoir, "ThirdCollegeDevoir", "third_college_devoirs", College, "3", Some("3college")),
    p(Devoir, "FirstBacMathDevoir", "first_bac_math_devoirs", Lycee, "1bac_math", Some("1bac_math")),
    p(Devoir, "FirstBacScienceDevoir", "first_bac_science_devoirs", Lycee, "1bac_science", Some("1bac_science")),
    p(Devoir, "FirstBacEconomicsDevoir", "first_bac_economics_devoirs", Lycee, "1bac_economics", Some("1bac_economics")),
    p(Devoir, "FirstBacLettersDevoir", "first_bac_letters_devoirs", Lycee, "1bac_letters", Some("1bac_letters")),
    p(Devoir, "SecondBacMathADevoir", "second_bac_math_a_devoirs", Lycee, "2bac_math_a", Some("2bac_math_a")),
    p(Devoir, "SecondBacMathBDevoir", "second_bac_math_b_devoirs", Lycee, "2bac_math_b", Some("2bac_math_b")),
    p(Devoir, "SecondBacPhysicsDevoir", "second_bac_physics_devoirs", Lycee, "2bac_physics", Some("2bac_physics")),
    p(Devoir, "SecondBacEconomicsDevoir", "second_bac_economics_devoirs", Lycee, "2bac_economics", Some("2bac_economics")),
    p(Devoir, "SecondBacTechnicalDevoir", "second_bac_technical_devoirs", Lycee, "2bac_technical", Some("2bac_technical")),
    p(Devoir, "SecondBacLettersDevoir", "second_bac_letters_devoirs", Lycee, "2bac_letters", Some("2bac_letters")),
    p(Devoir, "SecondBacPhysicsChemistryLifeSciencesDevoir", "second_bac_pcsvt_devoirs", Lycee, "2bac_pcsvt", Some("2bac_pcsvt")),
    p(Devoir, "SecondBacTechnicalCommonDevoir", "second_bac_tct_devoirs", Lycee, "2bac_tct", Some("2bac_tct")),
    p(Devoir, "CommonCoreLettersDevoir", "common_core_letters_devoirs", CommonCore, "common_core_letters", Some("letters")),
    p(Devoir, "CommonCoreScienceDevoir", "common_core_science_devoirs", CommonCore, "common_core_science", Some("science")),
    p(Devoir, "CommonCoreTechnicalDevoir", "common_core_technical_devoirs", CommonCore, "common_core_technical", Some("technical")),
    // Exams
    p(Exam, "SecondBacEconomicsExam", "second_bac_economics_exams", Lycee, "2bac_economics", Some("2bac_economics")),
    p(Exam, "SecondBacLettersExam", "second_bac_letters_exams", Lycee, "2bac_letters", Some("2bac_letters")),
    p(Exam, "SecondBacMathAExam", "second_bac_math_a_exams", Lycee, "2bac_math_a", Some("2bac_math_a")),
    p(Exam, "SecondBacMathBExam", "second_bac_math_b_exams", Lycee, "2bac_math_b", Some("2bac_math_b")),
    p(Exam, "SecondBacTechExam", "second_bac_tech_exams", Lycee, "2bac_tech", Some("2bac_tech")),
    p(Exam, "SecondBacPCSVTExam", "second_bac_pcsvt_exams", Lycee, "2bac_pcsvt", Some("2bac_pcsvt")),
    // Exam blancs
    p(ExamBlanc, "SecondBacEconomicsExamBlancs", "second_bac_economics_exam_blancs", Lycee, "2bac_economics", Some("2bac_economics")),
    p(ExamBlanc, "SecondBacLettersExamBlancs", "second_bac_letters_exam_blancs", Lycee, "2bac_letters", Some("2bac_letters")),
    p(ExamBlanc, "SecondBacMathAExamBlancs", "second_bac_math_a_exam_blancs", Lycee, "2bac_math_a", Some("2bac_math_a")),
    p(ExamBlanc, "SecondBacMathBExamBlancs", "second_bac_math_b_exam_blancs", Lycee, "2bac_math_b", Some("2bac_math_b")),
    p(ExamBlanc, "SecondBacTechExamBlancs", "second_bac_tech_exam_blancs", Lycee, "2bac_tech", Some("2bac_tech")),
    p(ExamBlanc, "SecondBacPCSVTExamBlancs", "second_bac_pcsvt_exam_blancs", Lycee, "2bac_pcsvt", Some("2bac_pcsvt")),
    // Flat families
    p(Book, "Book", "books", General, "general", None),
    p(PageDescription, "PageDescription", "page_descriptions", General, "general", None),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryError {
    #[error("Model parameter is required")]
    Missing { family: Family },

    #[error("Invalid model specified: {key}")]
    Unknown { family: Family, key: String },

    #[error("Invalid level: {0}")]
    UnknownLevel(String),

    #[error("Conflicting category keys: {first} and {second}")]
    Conflicting {
        family: Family,
        first: &'static str,
        second: &'static str,
    },
}

/// Category key as sent by clients, in query strings or request bodies.
///
/// Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryKey {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "type")]
    pub type_key: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

impl CategoryKey {
    pub fn model(name: impl Into<String>) -> Self {
        Self {
            model: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.model, &self.type_key, &self.level, &self.grade]
            .iter()
            .all(|v| non_blank(v).is_none())
    }

}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug)]
pub struct Catalog {
    by_model: HashMap<&'static str, &'static Partition>,
    by_type: HashMap<(Family, &'static str), &'static Partition>,
    by_grade: HashMap<(Family, Level, &'static str), &'static Partition>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        let mut by_model = HashMap::new();
        let mut by_type = HashMap::new();
        let mut by_grade = HashMap::new();
        for partition in PARTITIONS {
            let prev = by_model.insert(partition.model, partition);
            debug_assert!(prev.is_none(), "duplicate model: {}", partition.model);
            if let Some(key) = partition.type_key {
                let prev = by_type.insert((partition.family, key), partition);
                debug_assert!(prev.is_none(), "duplicate type key: {key}");
            }
            let prev = by_grade.insert((partition.family, partition.level, partition.grade), partition);
            debug_assert!(prev.is_none(), "duplicate grade: {}", partition.grade);
        }
        Self {
            by_model,
            by_type,
            by_grade,
        }
    }

    pub fn partitions(&self, family: Family) -> impl Iterator<Item = &'static Partition> {
        PARTITIONS.iter().filter(move |p| p.family == family)
    }

    pub fn by_model(&self, family: Family, model: &str) -> Option<&'static Partition> {
        self.by_model
            .get(model.trim())
            .copied()
            .filter(|p| p.family == family)
    }

    /// Resolves a key that may be sent in two places, such as the query
    /// string and the request body. Either side may be empty; when both are
    /// set they must name the same partition.
    pub fn resolve_either(
        &self,
        family: Family,
        first: &CategoryKey,
        second: &CategoryKey,
    ) -> Result<&'static Partition, CategoryError> {
        match (first.is_empty(), second.is_empty()) {
            (false, false) => {
                let a = self.resolve(family, first)?;
                let b = self.resolve(family, second)?;
                if a != b {
                    return Err(CategoryError::Conflicting {
                        family,
                        first: a.model,
                        second: b.model,
                    });
                }
                Ok(a)
            }
            (true, false) => self.resolve(family, second),
            _ => self.resolve(family, first),
        }
    }

    /// Resolves a key to one partition of `family`.
    ///
    /// Precedence: `model`, then `type`, then `(level, grade)`. A family with
    /// a single partition resolves an empty key to that partition.
    pub fn resolve(
        &self,
        family: Family,
        key: &CategoryKey,
    ) -> Result<&'static Partition, CategoryError> {
        if let Some(model) = non_blank(&key.model) {
            return self.by_model(family, model).ok_or_else(|| CategoryError::Unknown {
                family,
                key: model.to_string(),
            });
        }

        if let Some(type_key) = non_blank(&key.type_key) {
            return self
                .by_type
                .get(&(family, type_key))
                .copied()
                .ok_or_else(|| CategoryError::Unknown {
                    family,
                    key: type_key.to_string(),
                });
        }

        match (non_blank(&key.level), non_blank(&key.grade)) {
            (Some(level), Some(grade)) => {
                let unknown = || CategoryError::Unknown {
                    family,
                    key: format!("{level}/{grade}"),
                };
                let level = Level::parse(level).ok_or_else(unknown)?;
                self.by_grade
                    .get(&(family, level, grade))
                    .copied()
                    .ok_or_else(unknown)
            }
            (None, None) => {
                let mut partitions = self.partitions(family);
                match (partitions.next(), partitions.next()) {
                    (Some(only), None) => Ok(only),
                    _ => Err(CategoryError::Missing { family }),
                }
            }
            _ => Err(CategoryError::Missing { family }),
        }
    }

    /// Partitions of `family` matching optional level / grade filters.
    ///
    /// Filters that match nothing in the family are rejected rather than
    /// silently returning an empty selection.
    pub fn select(
        &self,
        family: Family,
        level: Option<&str>,
        grade: Option<&str>,
    ) -> Result<Vec<&'static Partition>, CategoryError> {
        let level = match level.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => {
                Some(Level::parse(raw).ok_or_else(|| CategoryError::UnknownLevel(raw.to_string()))?)
            }
            None => None,
        };
        let grade = grade.map(str::trim).filter(|v| !v.is_empty());

        let selected: Vec<_> = self
            .partitions(family)
            .filter(|p| level.is_none_or(|l| p.level == l))
            .filter(|p| grade.is_none_or(|g| p.grade == g))
            .collect();

        if selected.is_empty() && (level.is_some() || grade.is_some()) {
            let key = match (level, grade) {
                (Some(l), Some(g)) => format!("{l}/{g}"),
                (Some(l), None) => l.to_string(),
                (None, Some(g)) => g.to_string(),
                (None, None) => String::new(),
            };
            return Err(CategoryError::Unknown { family, key });
        }
        Ok(selected)
    }
}
