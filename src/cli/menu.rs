//! Numbered menus for picking a dataset.

use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::{Path, PathBuf};

use crossterm::style::{Color, Stylize};

use crate::browser::DEFAULT_DATASET_TASK;
use crate::present::layout::{panel, Paint};

const MENU_WIDTH: usize = 70;

/// Line-oriented prompts over any reader and writer.
pub struct Prompter<R: BufRead, W: Write> {
    input: R,
    output: W,
    color: bool,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn panel(&mut self, title: &str, body: &str, border: Color) -> io::Result<()> {
        let paint = Paint {
            border: &|s: &str| self.paint(s, border),
            title: &|s: &str| self.paint(s, border),
        };
        let lines = panel(title, body, MENU_WIDTH, &paint);
        for line in lines {
            writeln!(self.output, "{line}")?;
        }
        Ok(())
    }

    pub fn message(&mut self, text: &str, color: Color) -> io::Result<()> {
        let line = self.paint(text, color);
        writeln!(self.output, "{line}")
    }

    /// Ask for one line. `None` means input is closed.
    pub fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        let label = self.paint(label, Color::Yellow);
        write!(self.output, "\n{label}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask until the answer is one of `choices`.
    pub fn choose(&mut self, label: &str, choices: &[&str]) -> io::Result<Option<String>> {
        let prompt = format!("{label} [{}]", choices.join("/"));
        loop {
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(None);
            };
            if choices.contains(&answer.as_str()) {
                return Ok(Some(answer));
            }
            self.message("Please select one of the available options", Color::Red)?;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainChoice {
    Download,
    UseExisting,
    Exit,
}

pub fn main_menu<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> io::Result<MainChoice> {
    p.panel(
        "MAIN MENU",
        "Welcome To Agentic Exploratory Data Analysis\n\n\
         How will you like to proceed:\n\
         1. Download a dataset first.\n\
         2. Proceed with already downloaded dataset.\n\
         3. Exit",
        Color::Green,
    )?;
    Ok(match p.choose("Enter your choice", &["1", "2", "3"])?.as_deref() {
        Some("1") => MainChoice::Download,
        Some("2") => MainChoice::UseExisting,
        _ => MainChoice::Exit,
    })
}

/// Pick a browser-agent task. `None` goes back to the main menu.
pub fn download_menu<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> io::Result<Option<String>> {
    p.panel(
        "Download Menu",
        "1. Download default dataset (An-j96/SuperstoreData dataset from HuggingFace) via Browser Use\n\
         2. Give instruction for browser use to locate desired dataset, click download and STOP (to avoid infinite download check)\n\
         3. Back to main menu",
        Color::White,
    )?;
    match p.choose("Enter your choice", &["1", "2", "3"])?.as_deref() {
        Some("1") => Ok(Some(DEFAULT_DATASET_TASK.to_string())),
        Some("2") => Ok(p
            .ask("Enter the download instructions")?
            .filter(|task| !task.is_empty())),
        _ => Ok(None),
    }
}

/// Pick a local dataset file. `None` goes back to the main menu, including
/// when the chosen path is not a file.
pub fn existing_dataset_menu<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    default_dataset: &Path,
) -> io::Result<Option<PathBuf>> {
    p.panel(
        "Proceed with Existing Dataset",
        &format!(
            "1. Use default dataset (assumes was previously downloaded to '{}')\n\
             2. Provide path to your desired dataset\n\
             3. Back to main menu",
            default_dataset.display()
        ),
        Color::White,
    )?;
    let path = match p.choose("Enter choice", &["1", "2", "3"])?.as_deref() {
        Some("1") => default_dataset.to_path_buf(),
        Some("2") => match p.ask("Enter path to your dataset (e.g. ./Download/custom.csv)")? {
            Some(path) => PathBuf::from(path),
            None => return Ok(None),
        },
        _ => return Ok(None),
    };

    if !path.is_file() {
        p.message(
            &format!("File does not exist at path: {}", path.display()),
            Color::Red,
        )?;
        return Ok(None);
    }
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new()).with_color(false)
    }

    #[test]
    fn main_menu_retries_invalid_choice() {
        let mut p = prompter("7\n2\n");
        assert_eq!(main_menu(&mut p).unwrap(), MainChoice::UseExisting);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("MAIN MENU"));
        assert!(out.contains("Please select one of the available options"));
    }

    #[test]
    fn closed_input_exits() {
        let mut p = prompter("");
        assert_eq!(main_menu(&mut p).unwrap(), MainChoice::Exit);
    }

    #[test]
    fn download_menu_default_and_custom_tasks() {
        let mut p = prompter("1\n");
        assert_eq!(
            download_menu(&mut p).unwrap().as_deref(),
            Some(DEFAULT_DATASET_TASK)
        );

        let mut p = prompter("2\nfind the titanic csv on kaggle\n");
        assert_eq!(
            download_menu(&mut p).unwrap().as_deref(),
            Some("find the titanic csv on kaggle")
        );

        let mut p = prompter("3\n");
        assert_eq!(download_menu(&mut p).unwrap(), None);
    }

    #[test]
    fn existing_dataset_must_be_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("data.csv");
        std::fs::write(&dataset, "a,b\n1,2\n").unwrap();

        let mut p = prompter("1\n");
        assert_eq!(
            existing_dataset_menu(&mut p, &dataset).unwrap(),
            Some(dataset.clone())
        );

        let missing = dir.path().join("missing.csv");
        let mut p = prompter(&format!("2\n{}\n", missing.display()));
        assert_eq!(existing_dataset_menu(&mut p, &dataset).unwrap(), None);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("File does not exist at path"));
    }
}
