#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, FixedClock, Role, User};
use migration::MigratorTrait;

pub const PASSWORD: &str = "secret-pass";

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub async fn memory_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine_on(db: DatabaseConnection, now: DateTime<Utc>) -> Engine {
    Engine::builder()
        .database(db)
        .clock(FixedClock(now))
        .password_cost(4)
        .build()
        .await
        .unwrap()
}

/// Engine on a fresh in-memory database, clock fixed in June 2024.
pub async fn engine() -> Engine {
    engine_on(memory_db().await, at(2024, 6, 15)).await
}

pub async fn user(engine: &Engine, name: &str) -> User {
    let email = format!("{}@example.mn", name.to_lowercase());
    engine.sign_up(&email, PASSWORD, name).await.unwrap()
}

pub async fn admin(engine: &Engine) -> User {
    engine
        .create_user("admin@example.mn", PASSWORD, "Admin", Role::Admin)
        .await
        .unwrap()
}
