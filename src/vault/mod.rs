// Pass Protector - Vault Module
//
// The caller side of the credential flows: an explicit view state that
// decides between create and update, refreshes from the store after every
// write, and turns outcomes into user-visible notices. Also home to the
// per-record write locks shared by concurrent gateway clients.

mod clipboard;
mod error;
mod locks;
mod view;

pub use clipboard::{Clipboard, StdoutClipboard};
pub use error::VaultError;
pub use locks::RecordLocks;
pub use view::{mask_password, CopyField, EditMode, Field, Notice, NoticeLevel, Row, VaultView};

#[cfg(test)]
pub use clipboard::MemoryClipboard;
