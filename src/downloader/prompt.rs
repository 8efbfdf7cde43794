// Interactive terminal input

use std::io::{self, BufRead, Write};

use super::errors::DownloadError;
use super::traits::ConfirmationPrompt;

/// Only `s` (sim) counts as yes; anything else, including EOF, is no
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("s")
}

/// Print `question` and read one line from stdin
fn read_line(question: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", question)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

pub struct StdinPrompt;

impl ConfirmationPrompt for StdinPrompt {
    fn ask(&self, question: &str) -> bool {
        read_line(question).map_or(false, |answer| is_affirmative(&answer))
    }
}

/// Ask for the video URL
pub fn read_url() -> Result<String, DownloadError> {
    let url = read_line("Cole a URL do vídeo do YouTube: ")?.trim().to_string();
    if url.is_empty() {
        return Err(DownloadError::InvalidUrl("empty URL".to_string()));
    }
    Ok(url)
}
