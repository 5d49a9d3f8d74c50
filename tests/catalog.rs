mod common;

use bibliotheca::models::{BookQuery, BookSortKey, CreateBook, UpdateBook};
use bibliotheca::query::{MatchMode, Range, SortDirection};
use bibliotheca::AppError;
use chrono::{NaiveDate, Utc};

use common::{sample_book, setup};

#[tokio::test]
async fn add_then_get_round_trips_with_defaults() {
    let (_, services) = setup().await;

    let before = Utc::now();
    let id = services
        .catalog
        .add(&CreateBook::new("Moby-Dick").pages(635))
        .await
        .unwrap();
    let book = services.catalog.get(&id).await.unwrap().unwrap();

    assert_eq!(book.id, id);
    assert_eq!(book.name, "Moby-Dick");
    assert_eq!(book.pages, Some(635));
    assert_eq!(book.isbn, None);
    assert!(book.authors.is_empty());
    assert!(book.genres.is_empty());
    assert!(book.publisher.is_empty());
    assert_eq!(book.words, None);
    assert_eq!(book.pub_date, None);
    assert!(!book.borrowed);
    assert!(book.last_updated >= before && book.last_updated <= Utc::now());
}

#[tokio::test]
async fn get_unknown_id_is_none_not_error() {
    let (_, services) = setup().await;
    let id = "0123456789abcdef01234567".parse().unwrap();
    assert!(services.catalog.get(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_touches_only_the_provided_fields() {
    let (_, services) = setup().await;

    let id = services
        .catalog
        .add(
            &sample_book("Dune")
                .isbn("9780441172719")
                .pages(412)
                .pub_date(NaiveDate::from_ymd_opt(1965, 8, 1).unwrap()),
        )
        .await
        .unwrap();
    let original = services.catalog.get(&id).await.unwrap().unwrap();

    let updated = services
        .catalog
        .update(&id, &UpdateBook::default().pages(896))
        .await
        .unwrap();

    assert_eq!(updated.pages, Some(896));
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.isbn, original.isbn);
    assert_eq!(updated.authors, original.authors);
    assert_eq!(updated.pub_date, original.pub_date);
    assert!(updated.last_updated >= original.last_updated);
}

#[tokio::test]
async fn update_unknown_book_fails() {
    let (_, services) = setup().await;
    let id = "0123456789abcdef01234567".parse().unwrap();
    let result = services
        .catalog
        .update(&id, &UpdateBook::default().pages(1))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn update_rejects_empty_name() {
    let (_, services) = setup().await;
    let id = services.catalog.add(&sample_book("Dune")).await.unwrap();
    let result = services
        .catalog
        .update(&id, &UpdateBook::default().name(""))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn delete_returns_the_deleted_record() {
    let (_, services) = setup().await;

    let id = services.catalog.add(&sample_book("Dune")).await.unwrap();
    let deleted = services.catalog.delete(&id).await.unwrap().unwrap();
    assert_eq!(deleted.id, id);
    assert_eq!(deleted.name, "Dune");

    assert!(services.catalog.get(&id).await.unwrap().is_none());
    assert!(services.catalog.delete(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn add_rejects_missing_name() {
    let (_, services) = setup().await;
    let result = services.catalog.add(&CreateBook::new("")).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

async fn seed_search_fixture(services: &bibliotheca::Services) {
    for book in [
        CreateBook::new("Trump: The Art of the Deal")
            .authors(["Donald Trump", "Tony Schwartz"])
            .genres(["Business"])
            .pages(372)
            .pub_date(NaiveDate::from_ymd_opt(1987, 11, 1).unwrap()),
        CreateBook::new("Trump: Surviving at the Top")
            .authors(["Donald Trump"])
            .pages(236),
        CreateBook::new("The Art of War")
            .authors(["Sun Tzu"])
            .pages(372),
    ] {
        services.catalog.add(&book).await.unwrap();
    }
}

#[tokio::test]
async fn search_ands_across_fields() {
    let (_, services) = setup().await;
    seed_search_fixture(&services).await;

    // name must contain "trump" AND pages must fall in [370, 375]
    let query = BookQuery {
        name: vec!["trump".to_string()],
        pages: vec![Range {
            gte: Some(370),
            lte: Some(375),
            ..Default::default()
        }],
        ..Default::default()
    };
    let hits = services.catalog.search(&query).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Trump: The Art of the Deal");
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let (_, services) = setup().await;
    seed_search_fixture(&services).await;

    let query = BookQuery {
        name: vec!["ART OF".to_string()],
        ..Default::default()
    };
    let hits = services.catalog.search(&query).await.unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn search_matches_any_list_entry() {
    let (_, services) = setup().await;
    seed_search_fixture(&services).await;

    let query = BookQuery {
        authors: vec!["schwartz".to_string()],
        ..Default::default()
    };
    let hits = services.catalog.search(&query).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Trump: The Art of the Deal");
}

#[tokio::test]
async fn search_ranges_or_together() {
    let (_, services) = setup().await;
    seed_search_fixture(&services).await;

    let query = BookQuery {
        pages: vec![
            Range {
                lt: Some(300),
                ..Default::default()
            },
            Range {
                eq: Some(372),
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let hits = services.catalog.search(&query).await.unwrap();
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn search_empty_query_matches_everything() {
    let (_, services) = setup().await;
    seed_search_fixture(&services).await;

    let hits = services.catalog.search(&BookQuery::default()).await.unwrap();
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn search_prefix_mode_anchors_terms() {
    let (_, services) = setup().await;
    seed_search_fixture(&services).await;

    let query = BookQuery {
        name: vec!["art".to_string()],
        match_mode: MatchMode::Prefix,
        ..Default::default()
    };
    // "The Art of War" and "Trump: The Art of the Deal" contain "art", but
    // neither starts with it.
    let hits = services.catalog.search(&query).await.unwrap();
    assert!(hits.is_empty());

    let query = BookQuery {
        name: vec!["trump".to_string()],
        match_mode: MatchMode::Prefix,
        ..Default::default()
    };
    assert_eq!(services.catalog.search(&query).await.unwrap().len(), 2);
}

#[tokio::test]
async fn search_sorts_by_requested_keys() {
    let (_, services) = setup().await;
    seed_search_fixture(&services).await;

    let query = BookQuery {
        sort: vec![
            (BookSortKey::Pages, SortDirection::Descending),
            (BookSortKey::Name, SortDirection::Ascending),
        ],
        ..Default::default()
    };
    let hits = services.catalog.search(&query).await.unwrap();
    let names: Vec<&str> = hits.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "The Art of War",
            "Trump: The Art of the Deal",
            "Trump: Surviving at the Top",
        ]
    );
}
