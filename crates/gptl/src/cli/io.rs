//! Input and output stream selection.

use std::io::{Cursor, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite};

use super::Cli;
use super::init::prompt_line;

/// Pick the message source: `--input` file, then message words, then an
/// interactive prompt when stdin is a terminal, else stdin itself.
pub async fn open_input(cli: &Cli) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    if let Some(path) = &cli.input {
        let file = File::open(path)
            .await
            .with_context(|| format!("can't open input {}", path.display()))?;
        return Ok(Box::new(file));
    }

    if !cli.message.is_empty() {
        return Ok(Box::new(Cursor::new(message_from_args(&cli.message))));
    }

    if std::io::stdin().is_terminal() {
        let mut editor = reedline::Reedline::create();
        let message = prompt_line(&mut editor, "message")?;
        return Ok(Box::new(Cursor::new(message.into_bytes())));
    }

    Ok(Box::new(tokio::io::stdin()))
}

/// `--output` file (truncated) or stdout.
pub async fn open_output(path: Option<&Path>) -> Result<Box<dyn AsyncWrite + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .await
                .with_context(|| format!("can't create output {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}

/// Join message words, one per line.
pub fn message_from_args(words: &[String]) -> Vec<u8> {
    let mut buffer = String::new();
    for word in words {
        buffer.push_str(word);
        buffer.push('\n');
    }
    buffer.into_bytes()
}
