pub mod create_invitation;
pub mod initdb;
pub mod migrate_and_serve;
pub mod seed;
pub mod serve;

pub use create_invitation::create_invitation;
pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use seed::seed;
pub use serve::serve;
