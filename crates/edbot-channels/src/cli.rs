use crossterm::style::Stylize;
use edbot_core::channel::{Channel, ChannelError, ChannelMessage};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};

use crate::markdown::markdown_to_terminal;

const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

/// Terminal channel: reads lines from stdin and prints rendered replies.
///
/// `exit`, `quit` or end of input close the channel; blank lines are skipped.
pub struct CliChannel<R = BufReader<Stdin>, W = Stdout> {
    lines: Lines<R>,
    out: W,
    styled: bool,
}

impl CliChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::with_io(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), true)
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin + Send, W: AsyncWrite + Unpin + Send> CliChannel<R, W> {
    /// Channel over arbitrary I/O. `styled` enables ANSI colors.
    #[must_use]
    pub fn with_io(reader: R, out: W, styled: bool) -> Self {
        Self {
            lines: reader.lines(),
            out,
            styled,
        }
    }

    /// Consume the channel and return the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.out
    }

    fn label(&self, text: &str) -> String {
        if self.styled {
            text.bold().cyan().to_string()
        } else {
            text.to_owned()
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), ChannelError> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}

impl<R: AsyncBufRead + Unpin + Send, W: AsyncWrite + Unpin + Send> Channel for CliChannel<R, W> {
    async fn recv(&mut self) -> Result<Option<ChannelMessage>, ChannelError> {
        loop {
            let prompt = format!("{} ", self.label("You:"));
            self.write(&prompt).await?;

            let Some(line) = self.lines.next_line().await? else {
                self.write("\n").await?;
                return Ok(None);
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if EXIT_COMMANDS.contains(&trimmed) {
                tracing::debug!("cli session ended by user");
                return Ok(None);
            }

            return Ok(Some(ChannelMessage {
                text: trimmed.to_owned(),
            }));
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), ChannelError> {
        let rendered = format!("{} {}\n\n", self.label("EdBot:"), markdown_to_terminal(text));
        self.write(&rendered).await
    }

    async fn send_error(&mut self, message: &str, hint: &str) -> Result<(), ChannelError> {
        let rendered = if self.styled {
            format!("{} {message}\n{}\n\n", "Error:".bold().red(), hint.dim())
        } else {
            format!("Error: {message}\n{hint}\n\n")
        };
        self.write(&rendered).await
    }

    async fn send_status(&mut self, text: &str) -> Result<(), ChannelError> {
        let rendered = if self.styled {
            format!("{}\n", text.dim())
        } else {
            format!("{text}\n")
        };
        self.write(&rendered).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(input: &'static str) -> CliChannel<&'static [u8], Vec<u8>> {
        CliChannel::with_io(input.as_bytes(), Vec::new(), false)
    }

    #[tokio::test]
    async fn reads_trimmed_lines_and_skips_blanks() {
        let mut ch = channel("\n  hello there  \n\nsecond\n");
        assert_eq!(ch.recv().await.unwrap().unwrap().text, "hello there");
        assert_eq!(ch.recv().await.unwrap().unwrap().text, "second");
        assert!(ch.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exit_and_quit_close_the_channel() {
        let mut ch = channel("exit\nnever read\n");
        assert!(ch.recv().await.unwrap().is_none());
        let mut ch = channel("quit\n");
        assert!(ch.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_command_is_passed_through() {
        let mut ch = channel("/reset\n");
        assert_eq!(ch.recv().await.unwrap().unwrap().text, "/reset");
    }

    #[tokio::test]
    async fn send_renders_markdown() {
        let mut ch = channel("");
        ch.send("I'm **EdBot**").await.unwrap();
        let out = String::from_utf8(ch.into_writer()).unwrap();
        assert_eq!(out, "EdBot: I'm EdBot\n\n");
    }

    #[tokio::test]
    async fn errors_include_hint() {
        let mut ch = channel("");
        ch.send_error("chat request failed: rate limited", "Please try again.")
            .await
            .unwrap();
        let out = String::from_utf8(ch.into_writer()).unwrap();
        assert_eq!(out, "Error: chat request failed: rate limited\nPlease try again.\n\n");
    }
}
