//! The six content families and their validation rules.

use serde_json::Value;

use crate::app::content::{ContentKind, UniqueKey};
use crate::app::model::{
    Book, BookInput, Course, CourseInput, Devoir, DevoirInput, Exam, ExamBlanc, ExamBlancInput,
    ExamInput, ListFilter, PageDescription, PageDescriptionInput,
};
use crate::catalog::Family;
use crate::error::ValidationErrors;

pub const COURSE_NAME_MAX_CHARS: usize = 60;
pub const EXAM_YEARS: std::ops::RangeInclusive<i64> = 1900..=2100;

pub struct Courses;
pub struct Devoirs;
pub struct Exams;
pub struct ExamBlancs;
pub struct Books;
pub struct PageDescriptions;

impl ContentKind for Courses {
    const FAMILY: Family = Family::Course;

    type Fields = Course;
    type Input = CourseInput;
    type Update = CourseInput;

    fn build(input: CourseInput) -> Result<Course, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = course_name(&mut errors, input.name);
        let course = Course {
            name,
            description: optional_text(input.description),
            course_link: patch_link(&mut errors, "courseLink", None, input.course_link),
            exercise_link: patch_link(&mut errors, "exerciseLink", None, input.exercise_link),
            devoir_link: patch_link(&mut errors, "devoirLink", None, input.devoir_link),
            examen_link: patch_link(&mut errors, "examenLink", None, input.examen_link),
        };
        errors.finish(course)
    }

    fn apply(current: Course, update: CourseInput) -> Result<Course, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = match update.name {
            Some(name) => course_name(&mut errors, Some(name)),
            None => current.name,
        };
        let description = match update.description {
            Some(description) => optional_text(Some(description)),
            None => current.description,
        };
        let course = Course {
            name,
            description,
            course_link: patch_link(&mut errors, "courseLink", current.course_link, update.course_link),
            exercise_link: patch_link(
                &mut errors,
                "exerciseLink",
                current.exercise_link,
                update.exercise_link,
            ),
            devoir_link: patch_link(&mut errors, "devoirLink", current.devoir_link, update.devoir_link),
            examen_link: patch_link(&mut errors, "examenLink", current.examen_link, update.examen_link),
        };
        errors.finish(course)
    }
}

fn course_name(errors: &mut ValidationErrors, raw: Option<String>) -> String {
    let name = required(errors, "name", raw);
    if name.chars().count() > COURSE_NAME_MAX_CHARS {
        errors.push(
            "name",
            format!("name cannot be more than {COURSE_NAME_MAX_CHARS} characters"),
        );
    }
    name
}

impl ContentKind for Devoirs {
    const FAMILY: Family = Family::Devoir;

    type Fields = Devoir;
    type Input = DevoirInput;
    type Update = DevoirInput;

    fn build(input: DevoirInput) -> Result<Devoir, ValidationErrors> {
        devoir(input, None)
    }

    fn apply(current: Devoir, update: DevoirInput) -> Result<Devoir, ValidationErrors> {
        devoir(update, current.pdf_url)
    }

    fn matches(fields: &Devoir, filter: &ListFilter) -> bool {
        filter.semester.is_none_or(|s| fields.semester == s)
    }
}

fn devoir(input: DevoirInput, pdf_url: Option<String>) -> Result<Devoir, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let title = required(&mut errors, "title", input.title);
    let content = required(&mut errors, "content", input.content);
    let semester = match integer(&mut errors, "semester", input.semester) {
        Some(s @ (1 | 2)) => s as u8,
        Some(_) => {
            errors.push("semester", "semester must be 1 or 2");
            0
        }
        None => 0,
    };
    let pdf_url = patch_link(&mut errors, "pdfUrl", pdf_url, input.pdf_url);
    errors.finish(Devoir {
        title,
        content,
        semester,
        pdf_url,
    })
}

impl ContentKind for Exams {
    const FAMILY: Family = Family::Exam;

    type Fields = Exam;
    type Input = ExamInput;
    type Update = ExamInput;

    fn build(input: ExamInput) -> Result<Exam, ValidationErrors> {
        exam(input, None)
    }

    fn apply(current: Exam, update: ExamInput) -> Result<Exam, ValidationErrors> {
        exam(update, current.solution_url)
    }

    fn matches(fields: &Exam, filter: &ListFilter) -> bool {
        filter.year.is_none_or(|y| fields.year == y)
    }
}

fn exam(input: ExamInput, solution_url: Option<String>) -> Result<Exam, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let title = required(&mut errors, "title", input.title);
    let year = match integer(&mut errors, "year", input.year) {
        Some(y) if EXAM_YEARS.contains(&y) => y as i32,
        Some(_) => {
            errors.push(
                "year",
                format!(
                    "year must be between {} and {}",
                    EXAM_YEARS.start(),
                    EXAM_YEARS.end()
                ),
            );
            0
        }
        None => 0,
    };
    let pdf_url = required_link(&mut errors, "pdfUrl", input.pdf_url);
    let content = required(&mut errors, "content", input.content);
    let solution_url = patch_link(&mut errors, "solutionUrl", solution_url, input.solution_url);
    errors.finish(Exam {
        title,
        year,
        pdf_url,
        content,
        solution_url,
    })
}

impl ContentKind for ExamBlancs {
    const FAMILY: Family = Family::ExamBlanc;

    type Fields = ExamBlanc;
    type Input = ExamBlancInput;
    type Update = ExamBlancInput;

    fn build(input: ExamBlancInput) -> Result<ExamBlanc, ValidationErrors> {
        exam_blanc(input, None)
    }

    fn apply(current: ExamBlanc, update: ExamBlancInput) -> Result<ExamBlanc, ValidationErrors> {
        exam_blanc(update, current.solution_url)
    }
}

fn exam_blanc(
    input: ExamBlancInput,
    solution_url: Option<String>,
) -> Result<ExamBlanc, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let title = required(&mut errors, "title", input.title);
    let pdf_url = required_link(&mut errors, "pdfUrl", input.pdf_url);
    let content = required(&mut errors, "content", input.content);
    let solution_url = patch_link(&mut errors, "solutionUrl", solution_url, input.solution_url);
    errors.finish(ExamBlanc {
        title,
        pdf_url,
        content,
        solution_url,
    })
}

impl ContentKind for Books {
    const FAMILY: Family = Family::Book;

    type Fields = Book;
    type Input = BookInput;
    type Update = BookInput;

    fn build(input: BookInput) -> Result<Book, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let book = Book {
            title: required(&mut errors, "title", input.title),
            content: required(&mut errors, "content", input.content),
            image: patch_link(&mut errors, "image", None, input.image),
            description: input.description.unwrap_or_default(),
            author: input.author.unwrap_or_default(),
            is_active: input.is_active.unwrap_or(true),
        };
        errors.finish(book)
    }

    fn apply(_current: Book, update: BookInput) -> Result<Book, ValidationErrors> {
        Self::build(update)
    }

    fn matches(fields: &Book, filter: &ListFilter) -> bool {
        filter.is_active.is_none_or(|a| fields.is_active == a)
    }
}

impl ContentKind for PageDescriptions {
    const FAMILY: Family = Family::PageDescription;

    type Fields = PageDescription;
    type Input = PageDescriptionInput;
    type Update = PageDescriptionInput;

    fn build(input: PageDescriptionInput) -> Result<PageDescription, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page_path = required(&mut errors, "pagePath", input.page_path);
        if !page_path.is_empty() && !page_path.starts_with('/') {
            errors.push("pagePath", "pagePath must start with /");
        }
        let page = PageDescription {
            page_path,
            title: required(&mut errors, "title", input.title),
            description: required(&mut errors, "description", input.description),
            short_description: input
                .short_description
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            is_active: input.is_active.unwrap_or(true),
        };
        errors.finish(page)
    }

    fn apply(
        _current: PageDescription,
        update: PageDescriptionInput,
    ) -> Result<PageDescription, ValidationErrors> {
        Self::build(update)
    }

    fn matches(fields: &PageDescription, filter: &ListFilter) -> bool {
        filter.is_active.is_none_or(|a| fields.is_active == a)
    }

    fn unique_key(fields: &PageDescription) -> Option<UniqueKey> {
        Some(UniqueKey {
            field: "pagePath",
            value: fields.page_path.clone(),
            conflict_message: "Page path already exists",
        })
    }
}

/// Trimmed, non-blank text; records `"<field> is required"` otherwise.
fn required(errors: &mut ValidationErrors, field: &'static str, raw: Option<String>) -> String {
    match raw.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.push(field, format!("{field} is required"));
            String::new()
        }
    }
}

fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Absolute http(s) URL or a site-relative path (e.g. `/uploads/pdfs/x.pdf`).
pub fn is_link(raw: &str) -> bool {
    if raw.starts_with('/') {
        return !raw.starts_with("//");
    }
    url::Url::parse(raw).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

fn check_link(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if !is_link(value) {
        errors.push(
            field,
            format!("{field} must be an http(s) URL or a path starting with /"),
        );
    }
}

fn required_link(errors: &mut ValidationErrors, field: &'static str, raw: Option<String>) -> String {
    let value = required(errors, field, raw);
    if !value.is_empty() {
        check_link(errors, field, &value);
    }
    value
}

/// Optional link with keep / clear / set semantics: absent keeps `current`,
/// blank clears it.
fn patch_link(
    errors: &mut ValidationErrors,
    field: &'static str,
    current: Option<String>,
    incoming: Option<String>,
) -> Option<String> {
    let Some(raw) = incoming else {
        return current;
    };
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    check_link(errors, field, value);
    Some(value.to_string())
}

/// Integer given as a JSON number or a numeric string.
fn integer(errors: &mut ValidationErrors, field: &'static str, raw: Option<Value>) -> Option<i64> {
    let parsed = match raw {
        None | Some(Value::Null) => {
            errors.push(field, format!("{field} is required"));
            return None;
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push(field, format!("{field} is required"));
            return None;
        }
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    if parsed.is_none() {
        errors.push(field, format!("{field} must be an integer"));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn course(name: &str) -> CourseInput {
        CourseInput {
            name: Some(name.to_string()),
            ..CourseInput::default()
        }
    }

    #[test]
    fn links_accept_http_and_site_paths_only() {
        assert!(is_link("https://example.com/a.pdf"));
        assert!(is_link("http://example.com"));
        assert!(is_link("/uploads/pdfs/1-abc-a.pdf"));
        assert!(!is_link("//evil.example.com/x"));
        assert!(!is_link("javascript:alert(1)"));
        assert!(!is_link("ftp://example.com/file"));
        assert!(!is_link("not a url"));
    }

    #[test]
    fn course_requires_name_within_limit() {
        let err = Courses::build(CourseInput::default()).unwrap_err();
        assert_eq!(err.to_string(), "name is required");

        let err = Courses::build(course(&"x".repeat(61))).unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), ["name"]);

        let ok = Courses::build(course(&"é".repeat(60))).unwrap();
        assert_eq!(ok.name.chars().count(), 60);
    }

    #[test]
    fn course_patch_only_touches_supplied_fields() {
        let current = Courses::build(CourseInput {
            name: Some("Algebra".into()),
            course_link: Some("https://example.com/c".into()),
            exercise_link: Some("https://example.com/e".into()),
            ..CourseInput::default()
        })
        .unwrap();

        let next = Courses::apply(
            current,
            CourseInput {
                course_link: Some("/uploads/pdfs/c.pdf".into()),
                exercise_link: Some(String::new()),
                ..CourseInput::default()
            },
        )
        .unwrap();

        assert_eq!(next.name, "Algebra");
        assert_eq!(next.course_link.as_deref(), Some("/uploads/pdfs/c.pdf"));
        assert_eq!(next.exercise_link, None);
    }

    #[test]
    fn course_rejects_bad_link() {
        let err = Courses::build(CourseInput {
            name: Some("Algebra".into()),
            devoir_link: Some("javascript:void(0)".into()),
            ..CourseInput::default()
        })
        .unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), ["devoirLink"]);
    }

    #[test]
    fn devoir_collects_every_failing_field() {
        let err = Devoirs::build(DevoirInput {
            semester: Some(json!(3)),
            ..DevoirInput::default()
        })
        .unwrap_err();
        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            ["title", "content", "semester"]
        );
        assert_eq!(
            err.to_string(),
            "title is required, content is required, semester must be 1 or 2"
        );
    }

    #[test]
    fn devoir_semester_accepts_numeric_strings() {
        let devoir = Devoirs::build(DevoirInput {
            title: Some("D1".into()),
            content: Some("<p>x</p>".into()),
            semester: Some(json!("2")),
            pdf_url: None,
        })
        .unwrap();
        assert_eq!(devoir.semester, 2);
        assert_eq!(devoir.pdf_url, None);
    }

    #[test]
    fn devoir_update_keeps_or_clears_pdf() {
        let current = Devoir {
            title: "Old".into(),
            content: "old".into(),
            semester: 1,
            pdf_url: Some("/uploads/pdfs/a.pdf".into()),
        };
        let update = |pdf_url: Option<&str>| DevoirInput {
            title: Some("New".into()),
            content: Some("new".into()),
            semester: Some(json!(2)),
            pdf_url: pdf_url.map(str::to_string),
        };

        let kept = Devoirs::apply(current.clone(), update(None)).unwrap();
        assert_eq!(kept.pdf_url.as_deref(), Some("/uploads/pdfs/a.pdf"));
        assert_eq!(kept.title, "New");

        let cleared = Devoirs::apply(current.clone(), update(Some(""))).unwrap();
        assert_eq!(cleared.pdf_url, None);

        // Full replace: required fields cannot be omitted.
        assert!(Devoirs::apply(current, DevoirInput::default()).is_err());
    }

    #[test]
    fn exam_year_is_bounded() {
        let input = |year: Value| ExamInput {
            title: Some("Session normale".into()),
            year: Some(year),
            pdf_url: Some("https://example.com/exam.pdf".into()),
            content: Some("<p>x</p>".into()),
            solution_url: None,
        };
        assert_eq!(Exams::build(input(json!(2023))).unwrap().year, 2023);
        assert_eq!(Exams::build(input(json!("2019"))).unwrap().year, 2019);
        assert!(Exams::build(input(json!(1850))).is_err());
        assert!(Exams::build(input(json!("twenty"))).is_err());
        assert!(Exams::build(input(json!(true))).is_err());
    }

    #[test]
    fn exam_blanc_requires_pdf() {
        let err = ExamBlancs::build(ExamBlancInput {
            title: Some("Blanc 1".into()),
            content: Some("x".into()),
            ..ExamBlancInput::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "pdfUrl is required");
    }

    #[test]
    fn book_defaults_apply_on_create_and_replace() {
        let input = || BookInput {
            title: Some("Maths 1".into()),
            content: Some("<p>x</p>".into()),
            ..BookInput::default()
        };
        let book = Books::build(input()).unwrap();
        assert_eq!(book.image, None);
        assert_eq!(book.description, "");
        assert_eq!(book.author, "");
        assert!(book.is_active);

        let replaced = Books::apply(
            Book {
                is_active: false,
                author: "Someone".into(),
                ..book
            },
            input(),
        )
        .unwrap();
        assert!(replaced.is_active);
        assert_eq!(replaced.author, "");
    }

    #[test]
    fn page_description_is_trimmed_and_path_checked() {
        let page = PageDescriptions::build(PageDescriptionInput {
            page_path: Some("  /courses ".into()),
            title: Some(" Courses ".into()),
            description: Some(" All courses ".into()),
            short_description: Some("  short ".into()),
            is_active: None,
        })
        .unwrap();
        assert_eq!(page.page_path, "/courses");
        assert_eq!(page.title, "Courses");
        assert_eq!(page.short_description, "short");
        assert!(page.is_active);

        let err = PageDescriptions::build(PageDescriptionInput {
            page_path: Some("courses".into()),
            title: Some("t".into()),
            description: Some("d".into()),
            ..PageDescriptionInput::default()
        })
        .unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), ["pagePath"]);
    }

    #[test]
    fn filters_match_family_fields() {
        let devoir = Devoir {
            title: "t".into(),
            content: "c".into(),
            semester: 2,
            pdf_url: None,
        };
        let by_semester = |s| ListFilter {
            semester: Some(s),
            ..ListFilter::default()
        };
        assert!(Devoirs::matches(&devoir, &ListFilter::default()));
        assert!(Devoirs::matches(&devoir, &by_semester(2)));
        assert!(!Devoirs::matches(&devoir, &by_semester(1)));
    }
}
