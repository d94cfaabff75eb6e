mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{TestApp, message};

async fn create(app: &TestApp, uri: &str, body: Value) -> anyhow::Result<Value> {
    let (status, created) = app.send(app.json(Method::POST, uri, body)).await?;
    assert_eq!(status, StatusCode::CREATED, "create {uri}: {created}");
    Ok(created)
}

fn id(record: &Value) -> &str {
    record["id"].as_str().unwrap()
}

#[tokio::test]
async fn devoirs_filter_by_semester_and_keep_pdf_on_update() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let first = create(
        &app,
        "/api/devoirs",
        json!({
            "type": "1college",
            "title": "Devoir 1",
            "content": "<p>Exercice</p>",
            "semester": 1,
            "pdfUrl": "/uploads/pdfs/1-a-d1.pdf"
        }),
    )
    .await?;
    create(
        &app,
        "/api/devoirs?model=FirstCollegeDevoir",
        json!({"title": "Devoir 2", "content": "x", "semester": "2"}),
    )
    .await?;

    let (_, s1) = app
        .send(app.get("/api/devoirs?model=FirstCollegeDevoir&semester=1"))
        .await?;
    assert_eq!(s1.as_array().unwrap().len(), 1);
    assert_eq!(s1[0]["title"], "Devoir 1");

    let (status, _) = app
        .send(app.get("/api/devoirs?model=FirstCollegeDevoir&semester=first"))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/devoirs/{}?model=FirstCollegeDevoir", id(&first));
    let (status, updated) = app
        .send(app.json(
            Method::PUT,
            &uri,
            json!({"title": "Devoir 1 (corrigé)", "content": "y", "semester": 2}),
        ))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["semester"], 2);
    assert_eq!(updated["pdfUrl"], "/uploads/pdfs/1-a-d1.pdf");

    let (_, cleared) = app
        .send(app.json(
            Method::PATCH,
            &uri,
            json!({"title": "Devoir 1", "content": "y", "semester": 2, "pdfUrl": ""}),
        ))
        .await?;
    assert!(cleared.get("pdfUrl").is_none());

    let (status, body) = app
        .send(app.json(Method::PUT, &uri, json!({"title": "only a title"})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "content is required, semester is required");
    Ok(())
}

#[tokio::test]
async fn devoir_type_keys_are_family_scoped() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let created = create(
        &app,
        "/api/devoirs?type=letters",
        json!({"title": "Lettres", "content": "x", "semester": 1}),
    )
    .await?;
    assert_eq!(created["model"], "CommonCoreLettersDevoir");
    assert_eq!(created["level"], "common_core");

    let (status, _) = app
        .send(app.get("/api/devoirs?model=FirstCollegeCourse"))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn exams_validate_year_and_filter() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let exam = |year: Value| {
        json!({
            "model": "SecondBacPCSVTExam",
            "title": "Session normale",
            "year": year,
            "pdfUrl": "https://example.com/exam.pdf",
            "content": "<p>Sujet</p>"
        })
    };
    create(&app, "/api/exams", exam(json!(2022))).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let latest = create(&app, "/api/exams", exam(json!("2023"))).await?;
    assert_eq!(latest["year"], 2023);

    let (status, body) = app
        .send(app.json(Method::POST, "/api/exams", exam(json!(1800))))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "year must be between 1900 and 2100");

    let (_, by_year) = app
        .send(app.get("/api/exams?level=lycee&grade=2bac_pcsvt&year=2022"))
        .await?;
    assert_eq!(by_year.as_array().unwrap().len(), 1);
    assert_eq!(by_year[0]["year"], 2022);

    let (_, all) = app.send(app.get("/api/exams/all")).await?;
    assert_eq!(all[0]["id"], latest["id"]);
    Ok(())
}

#[tokio::test]
async fn exam_blancs_keep_solution_unless_cleared() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let created = create(
        &app,
        "/api/exam-blancs?model=SecondBacMathAExamBlancs",
        json!({
            "title": "Blanc 1",
            "pdfUrl": "/uploads/pdfs/b1.pdf",
            "content": "x",
            "solutionUrl": "/uploads/pdfs/b1-sol.pdf"
        }),
    )
    .await?;
    let uri = format!("/api/exam-blancs/{}?model=SecondBacMathAExamBlancs", id(&created));

    let (_, kept) = app
        .send(app.json(
            Method::PUT,
            &uri,
            json!({"title": "Blanc 1 bis", "pdfUrl": "/uploads/pdfs/b1.pdf", "content": "y"}),
        ))
        .await?;
    assert_eq!(kept["solutionUrl"], "/uploads/pdfs/b1-sol.pdf");
    assert_eq!(kept["title"], "Blanc 1 bis");

    let (status, body) = app
        .send(app.json(
            Method::PUT,
            &uri,
            json!({"title": "t", "pdfUrl": "ftp://example.com/b1.pdf", "content": "y"}),
        ))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        message(&body),
        "pdfUrl must be an http(s) URL or a path starting with /"
    );

    let (status, body) = app.send(app.delete(&uri)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(&body), "Exam Blanc deleted successfully");
    Ok(())
}

#[tokio::test]
async fn books_apply_defaults_and_filter_active() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let book = create(
        &app,
        "/api/books",
        json!({"title": "Analyse", "content": "<p>Chapitre 1</p>"}),
    )
    .await?;
    assert_eq!(book["isActive"], true);
    assert_eq!(book["image"], Value::Null);
    assert_eq!(book["author"], "");
    assert_eq!(book["level"], "general");

    let (status, updated) = app
        .send(app.json(
            Method::PUT,
            &format!("/api/books/{}", id(&book)),
            json!({"title": "Analyse", "content": "<p>v2</p>", "isActive": false}),
        ))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isActive"], false);

    create(&app, "/api/books", json!({"title": "Algèbre", "content": "x"})).await?;

    let (_, active) = app.send(app.get("/api/books?isActive=true")).await?;
    assert_eq!(active.as_array().unwrap().len(), 1);
    assert_eq!(active[0]["title"], "Algèbre");

    // Only the literal `true` selects active books.
    let (status, inactive) = app.send(app.get("/api/books?isActive=1")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inactive.as_array().unwrap().len(), 1);
    assert_eq!(inactive[0]["title"], "Analyse");

    let (_, everything) = app.send(app.get("/api/books")).await?;
    assert_eq!(everything.as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn page_paths_are_unique() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let page = |path: &str| {
        json!({
            "pagePath": path,
            "title": " Accueil ",
            "description": "Page d'accueil"
        })
    };
    let home = create(&app, "/api/page-descriptions", page("/")).await?;
    assert_eq!(home["title"], "Accueil");
    assert_eq!(home["shortDescription"], "");

    let (status, body) = app
        .send(app.json(Method::POST, "/api/page-descriptions", page("/")))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Page path already exists");

    let about = create(&app, "/api/page-descriptions", page("/about")).await?;
    let (status, _) = app
        .send(app.json(
            Method::PUT,
            &format!("/api/page-descriptions/{}", id(&about)),
            page("/"),
        ))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(app.delete(&format!("/api/page-descriptions/{}", id(&home))))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message(&body), "Page description deleted successfully");
    Ok(())
}
