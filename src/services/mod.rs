pub mod attachments_service;
pub mod auth_service;
pub mod boards_service;
pub mod cards_service;
pub mod checklists_service;
pub mod columns_service;
pub mod context;
pub mod invitations_service;

pub use attachments_service::AttachmentsService;
pub use auth_service::AuthService;
pub use boards_service::BoardsService;
pub use cards_service::CardsService;
pub use checklists_service::ChecklistsService;
pub use columns_service::ColumnsService;
pub use invitations_service::InvitationsService;
