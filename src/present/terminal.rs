//! [`Presenter`] that draws panels and tables on a terminal.

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};
use tracing::warn;

use super::image_grid::{decode_png, grid, render_half_blocks};
use super::layout::{panel, table, Paint};
use super::Presenter;
use crate::error::EdaError;
use crate::executor::{CodeExecutionResult, CommandExecutionResult};

const DEFAULT_WIDTH: usize = 80;
const IMAGE_COLUMNS: usize = 2;
const IMAGE_GAP: usize = 2;

pub struct TerminalPresenter<W: Write> {
    out: W,
    width: Option<usize>,
    color: bool,
    images: bool,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: None,
            color: true,
            images: true,
        }
    }

    /// Fix the width instead of querying the terminal.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Toggle inline image rendering; saved files are unaffected.
    pub fn with_images(mut self, images: bool) -> Self {
        self.images = images;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn width(&self) -> usize {
        self.width.unwrap_or_else(|| {
            crossterm::terminal::size()
                .map(|(w, _)| w as usize)
                .unwrap_or(DEFAULT_WIDTH)
        })
    }

    fn paint(&self, text: &str, color: Color, bold: bool) -> String {
        if !self.color {
            return text.to_string();
        }
        let styled = text.with(color);
        if bold {
            styled.bold().to_string()
        } else {
            styled.to_string()
        }
    }

    fn write_lines(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    fn draw_panel(&mut self, title: &str, body: &str, border: Color) -> io::Result<()> {
        let paint = Paint {
            border: &|s: &str| self.paint(s, border, false),
            title: &|s: &str| self.paint(s, border, true),
        };
        let lines = panel(title, body, self.width(), &paint);
        self.write_lines(&lines)
    }

    fn draw_table(&mut self, header: &str, body: &str) -> io::Result<()> {
        let paint = Paint {
            border: &|s: &str| self.paint(s, Color::Grey, false),
            title: &|s: &str| self.paint(s, Color::Magenta, true),
        };
        let lines = table(header, body, self.width(), &paint);
        self.write_lines(&lines)
    }

    fn draw_images(&mut self, images: &[String]) -> io::Result<()> {
        let width = self.width();
        let cell = (width.saturating_sub(IMAGE_GAP * (IMAGE_COLUMNS - 1)) / IMAGE_COLUMNS).max(1);
        let mut rendered = Vec::with_capacity(images.len());
        for (index, b64) in images.iter().enumerate() {
            match decode_png(b64) {
                Ok(image) => {
                    let fill = " ".repeat(cell.saturating_sub(image.width() as usize));
                    let mut lines = vec![format!("{:<cell$}", format!("Image {}", index + 1))];
                    lines.extend(
                        render_half_blocks(&image, cell as u32)
                            .into_iter()
                            .map(|row| row + &fill),
                    );
                    rendered.push(lines);
                }
                Err(err) => warn!(image = index + 1, error = %err, "cannot render image"),
            }
        }
        self.write_lines(&grid(&rendered, cell, IMAGE_COLUMNS, IMAGE_GAP))
    }

    fn report(result: io::Result<()>, what: &str) {
        if let Err(err) = result {
            warn!(error = %err, "failed to render {what}");
        }
    }

    fn try_code_result(&mut self, result: &CodeExecutionResult) -> io::Result<()> {
        if result.has_images() {
            let note = self.paint(
                "Image Outputs Displayed Below (if possible otherwise check temp-*.png files):",
                Color::Cyan,
                true,
            );
            self.draw_panel("Image Output", &note, Color::Green)?;
            if self.images {
                self.draw_images(&result.image_outputs)?;
            }
            for path in &result.saved_images {
                writeln!(self.out, "saved {}", path.display())?;
            }
        }

        let bundle = serde_json::to_string_pretty(&result.other_outputs)
            .unwrap_or_else(|e| format!("<unprintable output: {e}>"));
        self.draw_table("Code Execution Output", &bundle)?;

        if let Some(error) = &result.other_outputs.error {
            let mut body = format!("{} {error}", self.paint("Error:", Color::Red, true));
            if !error.traceback.is_empty() {
                body.push('\n');
                body.push_str(&error.traceback);
            }
            self.draw_panel("Execution Error", &body, Color::Red)?;
        }
        Ok(())
    }

    fn try_command_result(&mut self, result: &CommandExecutionResult) -> io::Result<()> {
        if let Some(output) = result.output() {
            let body = serde_json::to_string_pretty(output)
                .unwrap_or_else(|e| format!("<unprintable output: {e}>"));
            self.draw_table("Command Execution Output", &body)?;
        }
        if let Some(message) = result.execution_error() {
            let body = format!("{} {message}", self.paint("Error:", Color::Red, true));
            self.draw_panel("Execution Error", &body, Color::Red)?;
        }
        Ok(())
    }
}

impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    fn session_started(&mut self) {
        let body = format!(
            "{}\nType 'quit()' to exit.",
            self.paint("EDA Session Started", Color::Green, true)
        );
        let result = self.draw_panel("Exploratory Data Analysis", &body, Color::Green);
        Self::report(result, "session banner");
    }

    fn code_submitted(&mut self, code: &str) {
        let result = self.draw_panel("Agent Executing Python Code", code, Color::Blue);
        Self::report(result, "code panel");
    }

    fn command_submitted(&mut self, command: &str) {
        let result = self.draw_panel("Agent Executing Command On Terminal", command, Color::Blue);
        Self::report(result, "command panel");
    }

    fn code_result(&mut self, result: &CodeExecutionResult) {
        let outcome = self.try_code_result(result);
        Self::report(outcome, "code result");
    }

    fn command_result(&mut self, result: &CommandExecutionResult) {
        let outcome = self.try_command_result(result);
        Self::report(outcome, "command result");
    }

    fn assistant_response(&mut self, text: &str) {
        let line = self.paint(&format!(">>> Assistant Response: {text}"), Color::Green, true);
        let result = writeln!(self.out, "{line}").and_then(|_| self.out.flush());
        Self::report(result, "assistant response");
    }

    fn error(&mut self, error: &EdaError) {
        let result = self.draw_panel("Error", &error.to_string(), Color::Red);
        Self::report(result, "error panel");
    }

    fn info(&mut self, message: &str) {
        let line = self.paint(message, Color::Cyan, true);
        let result = writeln!(self.out, "{line}").and_then(|_| self.out.flush());
        Self::report(result, "info line");
    }
}
