// Pass Protector - Clipboard seam
//
// Writing to the OS clipboard is someone else's job. The CLI hands the value
// to stdout so it can be piped into `pbcopy`, `wl-copy` or `xclip`.

use std::io::Write;

use super::VaultError;

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), VaultError>;
}

/// Writes the copied value, newline-terminated, to standard output.
#[derive(Debug, Default)]
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), VaultError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", text)
            .and_then(|_| out.flush())
            .map_err(|e| VaultError::Clipboard(e.to_string()))
    }
}

/// Keeps the last copied value, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

#[cfg(test)]
impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), VaultError> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}
