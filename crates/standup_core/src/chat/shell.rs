//! Line-oriented message assembly for terminal chat shells.
//!
//! A terminal delivers one line at a time, but a `multi:` update needs
//! several. A line ending in `\` continues the message on the next line.

/// Marks a line as continued on the next one.
pub const CONTINUATION: char = '\\';

/// Joins continued input lines into whole chat messages.
#[derive(Debug, Default)]
pub struct MessageAssembler {
    pending: Vec<String>,
}

impl MessageAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one input line.
    ///
    /// Returns the complete message once a line without a trailing
    /// continuation arrives. Blank standalone lines yield nothing.
    pub fn push(&mut self, line: &str) -> Option<String> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(head) = line.trim_end().strip_suffix(CONTINUATION) {
            self.pending.push(head.trim_end().to_string());
            return None;
        }
        if self.pending.is_empty() && line.trim().is_empty() {
            return None;
        }
        self.pending.push(line.to_string());
        Some(self.take())
    }

    /// Flushes a message left open at end of input.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.iter().all(|line| line.trim().is_empty()) {
            self.pending.clear();
            return None;
        }
        Some(self.take())
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn take(&mut self) -> String {
        std::mem::take(&mut self.pending).join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::MessageAssembler;

    #[test]
    fn plain_lines_are_whole_messages() {
        let mut assembler = MessageAssembler::new();
        assert_eq!(
            assembler.push("standup: did X"),
            Some("standup: did X".to_string())
        );
        assert_eq!(assembler.push("   "), None);
        assert!(!assembler.is_pending());
    }

    #[test]
    fn trailing_backslash_continues_the_message() {
        let mut assembler = MessageAssembler::new();
        assert_eq!(assembler.push("standup: multi: \\"), None);
        assert_eq!(assembler.push("fixed login\\"), None);
        assert!(assembler.is_pending());
        assert_eq!(
            assembler.push("reviewed PRs"),
            Some("standup: multi:\nfixed login\nreviewed PRs".to_string())
        );
        assert!(!assembler.is_pending());
    }

    #[test]
    fn finish_flushes_an_open_message() {
        let mut assembler = MessageAssembler::new();
        assembler.push("standup: multi:\\");
        assembler.push("wrote docs\\");
        assert_eq!(
            assembler.finish(),
            Some("standup: multi:\nwrote docs".to_string())
        );
        assert_eq!(assembler.finish(), None);
    }
}
