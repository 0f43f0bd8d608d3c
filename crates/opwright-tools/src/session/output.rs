//! Output capture for ephemeral commands

/// Bounded buffer collecting raw PTY output for one command.
#[derive(Debug)]
pub(crate) struct OutputCapture {
    bytes: Vec<u8>,
    cap: usize,
    truncated: bool,
}

impl OutputCapture {
    pub fn new(cap: usize) -> Self {
        Self {
            bytes: Vec::new(),
            cap,
            truncated: false,
        }
    }

    /// Append a chunk, dropping anything beyond the cap
    pub fn push(&mut self, chunk: &[u8]) {
        if self.truncated {
            return;
        }
        let room = self.cap.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.bytes.extend_from_slice(&chunk[..room]);
            self.truncated = true;
        } else {
            self.bytes.extend_from_slice(chunk);
        }
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Decode as UTF-8 (lossy) and strip terminal control sequences
    pub fn into_text(self) -> String {
        strip_ansi_escapes(&String::from_utf8_lossy(&self.bytes))
    }
}

/// Remove the terminal's echo of the lines written to the session.
///
/// Each written line is dropped at most once, on its first exact match.
/// The `exit` notice an interactive shell prints when leaving is dropped too.
pub(crate) fn strip_input_echo(output: &str, written: &str) -> String {
    let mut pending: Vec<&str> = written
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let mut kept: Vec<&str> = output
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            match pending.iter().position(|w| *w == trimmed) {
                Some(idx) => {
                    pending.remove(idx);
                    false
                }
                None => true,
            }
        })
        .collect();
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }
    if kept.last().is_some_and(|l| l.trim() == "exit") {
        kept.pop();
    }
    kept.join("\n").trim().to_string()
}

/// Strip ANSI escape sequences and carriage returns from PTY output.
pub(crate) fn strip_ansi_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                // CSI: ESC [ params intermediates final
                Some('[') => {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if ('\x40'..='\x7e').contains(&next) {
                            break;
                        }
                    }
                }
                // OSC: ESC ] ... (BEL | ESC \)
                Some(']') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '\x07' {
                            break;
                        }
                        if next == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_escapes() {
        let input = "\x1b[32mok\x1b[0m done\r\n\x1b]0;title\x07next";
        assert_eq!(strip_ansi_escapes(input), "ok done\nnext");
    }

    #[test]
    fn test_strip_input_echo() {
        let output = "echo hi\nexit $?\nhi\nexit\n";
        assert_eq!(strip_input_echo(output, "echo hi\nexit $?\n"), "hi");
        // Only the first matching line is treated as echo
        let repeated = "ls\nls\n";
        assert_eq!(strip_input_echo(repeated, "ls\n"), "ls");
    }

    #[test]
    fn test_capture_truncates_at_cap() {
        let mut capture = OutputCapture::new(5);
        capture.push(b"abc");
        capture.push(b"defgh");
        capture.push(b"ij");
        assert!(capture.truncated());
        assert_eq!(capture.into_text(), "abcde");
    }
}
