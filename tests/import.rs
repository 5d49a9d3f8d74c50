mod common;

use std::io::Write as _;
use std::path::PathBuf;

use bibliotheca::models::{BookQuery, BorrowerQuery};
use bibliotheca::AppError;
use chrono::NaiveDate;
use tempfile::TempDir;

use common::{sample_borrower, setup};

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn book_import_coerces_and_inserts_all_records() {
    let (_, services) = setup().await;
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "books.json",
        r#"[
            {"name": "Trump: The Art of the Deal",
             "authors": ["Donald Trump", "Tony Schwartz"],
             "genres": "Business",
             "pages": 372,
             "pub_date": {"year": 1987, "month": 11, "day": 1}},
            {"name": "The Art of War",
             "authors": "Sun Tzu",
             "pub_date": "0500-01-01"}
        ]"#,
    );

    let ids = services.catalog.import_books(&path).await.unwrap();
    assert_eq!(ids.len(), 2);

    let first = services.catalog.get(&ids[0]).await.unwrap().unwrap();
    assert_eq!(first.genres, vec!["Business"]);
    assert_eq!(first.pub_date, NaiveDate::from_ymd_opt(1987, 11, 1));

    let second = services.catalog.get(&ids[1]).await.unwrap().unwrap();
    assert_eq!(second.authors, vec!["Sun Tzu"]);
}

#[tokio::test]
async fn book_import_is_all_or_nothing() {
    let (_, services) = setup().await;
    let dir = TempDir::new().unwrap();

    // Second record has no name, so nothing may land.
    let path = write_fixture(
        &dir,
        "books.json",
        r#"[{"name": "Emma"}, {"name": ""}]"#,
    );
    let result = services.catalog.import_books(&path).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(services
        .catalog
        .search(&BookQuery::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn book_import_rejects_invalid_date_parts() {
    let (_, services) = setup().await;
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "books.json",
        r#"[{"name": "Emma", "pub_date": {"year": 2001, "month": 2, "day": 30}}]"#,
    );
    assert!(matches!(
        services.catalog.import_books(&path).await,
        Err(AppError::Parse(_))
    ));
}

#[tokio::test]
async fn import_rejects_non_json_files() {
    let (_, services) = setup().await;
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "books.bson", "whatever");
    assert!(matches!(
        services.catalog.import_books(&path).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn borrower_import_inserts_fresh_accounts() {
    let (_, services) = setup().await;
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "borrowers.json",
        r#"[
            {"username": "tim", "password": "swordfish", "name": "Tim Smith",
             "phone": "555-0100", "email": "tim@example.com", "address": "12 Main St"},
            {"username": "ana", "password": "hunter2", "name": "Ana Ruiz",
             "phone": "555-0101", "email": "ana@example.com", "address": "3 Oak Ave"}
        ]"#,
    );

    let ids = services.accounts.import_borrowers(&path, false).await.unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(
        services
            .accounts
            .search(&BorrowerQuery::default())
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn borrower_import_with_update_upserts_by_username() {
    let (_, services) = setup().await;
    services
        .accounts
        .signup(&sample_borrower("tim"))
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "borrowers.json",
        r#"[{"username": "tim", "password": "changed", "name": "Tim Smith",
             "phone": "555-0999", "email": "tim@example.com", "address": "12 Main St"}]"#,
    );

    let ids = services.accounts.import_borrowers(&path, true).await.unwrap();
    assert_eq!(ids.len(), 1);

    let account = services.accounts.get(&ids[0]).await.unwrap().unwrap();
    assert_eq!(account.username, "tim");
    assert_eq!(account.password, "changed");
    assert_eq!(account.phone, "555-0999");

    // Still a single account for the username.
    assert_eq!(
        services
            .accounts
            .search(&BorrowerQuery::default())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn borrower_import_without_update_aborts_on_taken_username() {
    let (_, services) = setup().await;
    services
        .accounts
        .signup(&sample_borrower("tim"))
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "borrowers.json",
        r#"[
            {"username": "ana", "password": "hunter2", "name": "Ana Ruiz",
             "phone": "555-0101", "email": "ana@example.com", "address": "3 Oak Ave"},
            {"username": "tim", "password": "other", "name": "Tim Smith",
             "phone": "555-0100", "email": "tim@example.com", "address": "12 Main St"}
        ]"#,
    );

    let result = services.accounts.import_borrowers(&path, false).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // The batch aborted as a whole: "ana" was not inserted either.
    let hits = services
        .accounts
        .search(&BorrowerQuery::default())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].username, "tim");
}
