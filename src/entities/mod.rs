//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod ai_summary;
pub mod folder;
pub mod page;
pub mod user;

// Re-export specific types to avoid conflicts
pub use ai_summary::{
    Column as AiSummaryColumn, Entity as AiSummary, Model as AiSummaryModel,
};
pub use folder::{Column as FolderColumn, Entity as Folder, Model as FolderModel};
pub use page::{Column as PageColumn, Entity as Page, Model as PageModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
