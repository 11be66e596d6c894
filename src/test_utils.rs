#[cfg(test)]
pub mod test_utils {
    use crate::auth::{password::hash_password, session::create_session};
    use crate::config::{InvitationMode, Settings};
    use crate::content::ContentStore;
    use crate::rate_limit::{RateLimiter, LEAD_LIMIT, LEAD_WINDOW};
    use crate::router::create_router;
    use crate::schemas::AppState;
    use crate::storage::LocalStorage;
    use crate::auth::invitation::{InvitationTable, InvitationVerifier, PresenceOnly};
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use listing::centers::{create_center, NewCenter};
    use listing::images::add_image;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{state, user, user::Role};
    use moka::future::Cache;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Ids of the seeded directory.
    ///
    /// - Selangor: Premier Dialysis Klang (featured, Klang, has coordinates),
    ///   Klang Care Dialysis (Klang), Shah Alam Renal Centre (Shah Alam)
    /// - Kuala Lumpur: KL Kidney Centre (Cheras, has coordinates, two images)
    /// - Perlis: no centers
    pub struct Fixture {
        pub premier_klang_id: String,
        pub klang_care_id: String,
        pub shah_alam_id: String,
        pub kl_kidney_id: String,
        pub kl_kidney_images: Vec<String>,
    }

    pub struct TestContext {
        pub state: AppState,
        pub fixture: Fixture,
        /// Holds the storage and content directories
        pub workspace: TempDir,
        _tracing: tracing::subscriber::DefaultGuard,
    }

    impl TestContext {
        pub fn server(&self) -> TestServer {
            TestServer::new(create_router(self.state.clone())).expect("Failed to start test server")
        }
    }

    fn center(name: &str, town: &str, state: &str) -> NewCenter {
        NewCenter {
            name: name.to_string(),
            slug: Some(name.to_string()),
            address: format!("12 Jalan Besar, {}", town),
            town: town.to_string(),
            state: state.to_string(),
            tel: Some("03-1234 5678".to_string()),
            ..Default::default()
        }
    }

    async fn seed_directory(db: &DatabaseConnection) -> Fixture {
        for name in ["Selangor", "Kuala Lumpur", "Perlis"] {
            state::ActiveModel {
                name: Set(name.to_string()),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to insert state");
        }

        let mut premier = center("Premier Dialysis Klang", "Klang", "Selangor");
        premier.featured = true;
        premier.latitude = Some(3.0449);
        premier.longitude = Some(101.4455);
        let premier = create_center(db, premier).await.expect("Failed to seed center");

        let klang_care = create_center(db, center("Klang Care Dialysis", "Klang", "Selangor"))
            .await
            .expect("Failed to seed center");
        let shah_alam = create_center(db, center("Shah Alam Renal Centre", "Shah Alam", "Selangor"))
            .await
            .expect("Failed to seed center");

        let mut kl = center("KL Kidney Centre", "Cheras", "Kuala Lumpur");
        kl.latitude = Some(3.1073);
        kl.longitude = Some(101.7260);
        let kl = create_center(db, kl).await.expect("Failed to seed center");

        let mut kl_kidney_images = Vec::new();
        for n in 1..=2 {
            let image = add_image(db, &kl.id, &format!("centers/{}/{}.jpg", kl.id, n))
                .await
                .expect("Failed to seed image");
            kl_kidney_images.push(image.id);
        }

        Fixture {
            premier_klang_id: premier.id,
            klang_care_id: klang_care.id,
            shah_alam_id: shah_alam.id,
            kl_kidney_id: kl.id,
            kl_kidney_images,
        }
    }

    fn write_blog(content_dir: &std::path::Path) {
        let blog = content_dir.join("blog");
        std::fs::create_dir_all(&blog).expect("Failed to create blog dir");
        std::fs::write(
            blog.join("first-session.md"),
            "---\ntitle: Your first dialysis session\ndescription: What to expect\ndate: 2024-03-01\ntags: [basics]\n---\nArrive early.\n",
        )
        .expect("Failed to write post");
        std::fs::write(
            blog.join("choosing-a-centre.md"),
            "---\ntitle: Choosing a centre\ndescription: Questions to ask\ndate: 2024-06-15\n---\nVisit first.\n",
        )
        .expect("Failed to write post");
        std::fs::write(
            blog.join("coming-soon.md"),
            "---\ntitle: Coming soon\ndescription: Draft\ndate: 2024-07-01\ndraft: true\n---\nTBD\n",
        )
        .expect("Failed to write post");
    }

    /// Create AppState for testing, with a seeded directory and blog
    pub async fn setup_test_app_state_with(invitation_mode: InvitationMode) -> TestContext {
        let tracing = init_test_tracing();
        let db = setup_test_db().await;
        let fixture = seed_directory(&db).await;

        let workspace = tempfile::tempdir().expect("Failed to create temp dir");
        let storage_dir = workspace.path().join("uploads");
        let content_dir = workspace.path().join("content");
        write_blog(&content_dir);

        let settings = Settings {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            redis_url: None,
            site_url: "https://dialysis.my".to_string(),
            storage_dir: storage_dir.clone(),
            content_dir: content_dir.clone(),
            invitation_mode,
            trust_proxy_headers: true,
            session_ttl_hours: 168,
        };

        let invitations: Arc<dyn InvitationVerifier> = match invitation_mode {
            InvitationMode::Table => Arc::new(InvitationTable),
            InvitationMode::Presence => Arc::new(PresenceOnly),
        };

        let state = AppState {
            db,
            cache: Cache::new(100),
            rate_limiter: RateLimiter::in_memory(LEAD_LIMIT, LEAD_WINDOW),
            storage: Arc::new(LocalStorage::new(&storage_dir)),
            content: Arc::new(ContentStore::load(&content_dir).expect("Failed to load content")),
            invitations,
            settings: Arc::new(settings),
        };

        TestContext {
            state,
            fixture,
            workspace,
            _tracing: tracing,
        }
    }

    pub async fn setup_test_app_state() -> TestContext {
        setup_test_app_state_with(InvitationMode::Table).await
    }

    /// Creates a user with `role` and returns a live session token.
    pub async fn sign_in_as(db: &DatabaseConnection, role: Role, email: &str) -> String {
        let now = Utc::now();
        let account = user::ActiveModel {
            email: Set(email.to_string()),
            name: Set("Test User".to_string()),
            password_hash: Set(hash_password("correct-horse").expect("Failed to hash")),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create user");

        create_session(db, account.id, Duration::hours(1))
            .await
            .expect("Failed to create session")
            .token
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set. The subscriber is removed when the
    /// guard is dropped.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create a test server over a freshly seeded app
    pub async fn setup_test_app() -> (TestServer, TestContext) {
        let context = setup_test_app_state().await;
        let server = context.server();
        (server, context)
    }
}
