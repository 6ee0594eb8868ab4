pub mod browser;
pub mod drive;
pub mod lister;
pub mod poller;
pub mod proxy;
pub mod server;
pub mod storage;

mod error;

pub use crate::browser::{Browser, Notice, NoticeLevel, Preview};
pub use crate::drive::{Drive, FileBlob, UploadPolicy};
pub use crate::lister::Lister;
pub use crate::poller::{MutationKind, PendingMutation, PollEvent, PollOutcome, Poller};

pub const USER_AGENT: &str = concat!("repodrived/", env!("CARGO_PKG_VERSION"));
