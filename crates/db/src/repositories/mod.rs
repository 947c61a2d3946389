//! Repository abstractions for data access.

pub mod account;
pub mod entry;
pub mod transfer;
pub mod user;

pub use account::AccountRepository;
pub use entry::EntryRepository;
pub use transfer::TransferRepository;
pub use user::UserRepository;
