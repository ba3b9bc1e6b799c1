pub mod order;
pub mod slug;
