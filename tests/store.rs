mod common;

use bibliotheca::models::EntityId;
use bibliotheca::{AppError, Library, Services};

use common::{memory_config, sample_book, setup};

#[tokio::test]
async fn missing_collection_is_reported_by_name() {
    // A zero-length file is a valid, empty SQLite database.
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("empty.db");
    std::fs::File::create(&path).unwrap();

    let mut config = memory_config();
    config.database.url = format!("sqlite://{}", path.display());
    config.database.create_missing = false;

    let result = Library::connect(&config).await;
    match result {
        Err(AppError::MissingCollection(name)) => assert_eq!(name, "books"),
        other => panic!("expected MissingCollection, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn collection_names_are_configurable() {
    let mut config = memory_config();
    config.collections.books = "tomes".to_string();
    config.collections.borrowers = "patrons".to_string();

    let library = Library::connect(&config).await.unwrap();
    let services = Services::new(library, &config);

    let id = services.catalog.add(&sample_book("Dune")).await.unwrap();
    assert!(services.catalog.get(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn collection_names_must_be_identifiers() {
    let mut config = memory_config();
    config.collections.loans = "loans; DROP TABLE books".to_string();

    assert!(matches!(
        Library::connect(&config).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn reconnecting_to_an_existing_store_passes_the_presence_check() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = memory_config();
    config.database.url = format!("sqlite://{}/library.db", dir.path().display());

    // First connect creates the schema, second one only checks it.
    let library = Library::connect(&config).await.unwrap();
    library.disconnect().await;

    config.database.create_missing = false;
    let library = Library::connect(&config).await.unwrap();
    library.disconnect().await;
}

#[tokio::test]
async fn malformed_ids_fail_parsing_not_lookup() {
    let (_, services) = setup().await;

    let err = "not-a-hex-id".parse::<EntityId>().unwrap_err();
    assert!(matches!(err, AppError::InvalidId(_)));

    // A well-formed but unknown id is an ordinary miss.
    let ghost: EntityId = "ffffffffffffffffffffffff".parse().unwrap();
    assert!(services.catalog.get(&ghost).await.unwrap().is_none());
}
