#![allow(dead_code)]

use bibliotheca::config::{
    AdminConfig, AppConfig, CollectionsConfig, DatabaseConfig, LoggingConfig,
};
use bibliotheca::models::{CreateBook, CreateBorrower};
use bibliotheca::{Library, Services};

/// Configuration for an in-memory store that is created on connect.
pub fn memory_config() -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
            create_missing: true,
        },
        collections: CollectionsConfig::default(),
        admin: AdminConfig {
            username: "admin".to_string(),
            password: "t0psecret".to_string(),
        },
        logging: LoggingConfig::default(),
    }
}

pub async fn setup() -> (Library, Services) {
    let config = memory_config();
    let library = Library::connect(&config).await.expect("connect");
    let services = Services::new(library.clone(), &config);
    (library, services)
}

pub fn sample_book(name: &str) -> CreateBook {
    CreateBook::new(name)
        .authors(["Jane Doe"])
        .genres(["Fiction"])
        .publisher(["Acme Press"])
}

pub fn sample_borrower(username: &str) -> CreateBorrower {
    CreateBorrower {
        username: username.to_string(),
        password: "swordfish".to_string(),
        name: "Tim Smith".to_string(),
        phone: "555-0100".to_string(),
        email: format!("{}@example.com", username),
        address: "12 Main St".to_string(),
    }
}
