//! Root of all SeaORM entity modules for the dialysis center directory.

pub mod center_image;
pub mod dialysis_center;
pub mod invitation;
pub mod lead;
pub mod session;
pub mod state;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::center_image::Entity as CenterImage;
    pub use super::dialysis_center::Entity as DialysisCenter;
    pub use super::invitation::Entity as Invitation;
    pub use super::lead::Entity as Lead;
    pub use super::session::Entity as Session;
    pub use super::state::Entity as State;
    pub use super::user::Entity as User;
}
