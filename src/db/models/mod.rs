// Sub-modules organized by functional domain
pub mod api;
pub mod attachment;
pub mod board;
pub mod card;
pub mod column;
pub mod invitation;
pub mod user;

// API response structures
pub use api::*;

pub use attachment::*;
pub use board::*;
pub use card::*;
pub use column::*;
pub use invitation::*;
pub use user::*;
