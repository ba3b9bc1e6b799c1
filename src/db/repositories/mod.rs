pub mod attachments;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod invitations;
pub mod users;

pub use attachments::AttachmentRepo;
pub use boards::BoardRepo;
pub use cards::CardRepo;
pub use columns::ColumnRepo;
pub use invitations::InvitationRepo;
pub use users::UserRepo;
