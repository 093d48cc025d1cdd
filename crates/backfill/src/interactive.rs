use std::path::PathBuf;

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use thiserror::Error;

use crate::inputs::{check_input, files_in_directory};

/// Keywords typed at any prompt that leave the normal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromptInterrupt {
    #[error("quit requested")]
    Quit,
    #[error("reset requested")]
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub files: Vec<PathBuf>,
    pub output: Option<PathBuf>,
}

const MENU: [&str; 4] = [
    "Process a single file",
    "Process every file in a directory",
    "Process multiple files",
    "Quit",
];

/// Runs the menu until the user picks inputs. `None` means the user quit.
pub fn prompt_selection() -> Result<Option<Selection>> {
    loop {
        match prompt_once() {
            Ok(selection) => return Ok(Some(selection)),
            Err(err) => match err.downcast_ref::<PromptInterrupt>() {
                Some(PromptInterrupt::Quit) => return Ok(None),
                Some(PromptInterrupt::Reset) => {
                    println!("\nStarting over.\n");
                }
                None => return Err(err),
            },
        }
    }
}

fn prompt_once() -> Result<Selection> {
    let theme = ColorfulTheme::default();
    println!("Type 'quit' to exit or 'reset' to start over at any prompt.");
    let choice = Select::with_theme(&theme)
        .with_prompt("What would you like to process?")
        .items(&MENU)
        .default(0)
        .interact()?;

    let files = match choice {
        0 => vec![prompt_file(&theme)?],
        1 => prompt_directory(&theme)?,
        2 => prompt_many(&theme)?,
        _ => return Err(PromptInterrupt::Quit.into()),
    };
    let output = prompt_output(&theme)?;
    Ok(Selection { files, output })
}

fn prompt_file(theme: &ColorfulTheme) -> Result<PathBuf> {
    loop {
        let text = ask(theme, "Path to the input file")?;
        match check_input(&PathBuf::from(text)) {
            Ok(path) => return Ok(path),
            Err(err) => println!("  {err}"),
        }
    }
}

fn prompt_directory(theme: &ColorfulTheme) -> Result<Vec<PathBuf>> {
    loop {
        let text = ask(theme, "Path to the input directory")?;
        match files_in_directory(&PathBuf::from(text)) {
            Ok(files) if files.is_empty() => {
                println!("  No .csv, .xlsx or .xls files found there.");
            }
            Ok(files) => {
                println!("  Found {} file(s).", files.len());
                return Ok(files);
            }
            Err(err) => println!("  {err}"),
        }
    }
}

fn prompt_many(theme: &ColorfulTheme) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    println!("Enter one path per prompt. Type 'done' or press Enter on an empty line to finish.");
    loop {
        let text = ask(theme, &format!("File #{}", files.len() + 1))?;
        if text.is_empty() || text.eq_ignore_ascii_case("done") {
            if files.is_empty() {
                println!("  Add at least one file first.");
                continue;
            }
            return Ok(files);
        }
        match check_input(&PathBuf::from(text)) {
            Ok(path) if files.contains(&path) => println!("  Already added: {}", path.display()),
            Ok(path) => files.push(path),
            Err(err) => println!("  {err}"),
        }
    }
}

fn prompt_output(theme: &ColorfulTheme) -> Result<Option<PathBuf>> {
    let different = Confirm::with_theme(theme)
        .with_prompt("Save results to a different output directory?")
        .default(false)
        .interact()?;
    if !different {
        return Ok(None);
    }
    loop {
        let text = ask(theme, "Output directory")?;
        if !text.is_empty() {
            return Ok(Some(PathBuf::from(text)));
        }
    }
}

/// Reads one line, turning the quit/reset keywords into a [`PromptInterrupt`].
fn ask(theme: &ColorfulTheme, prompt: &str) -> Result<String> {
    let raw: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let text = clean_path_text(&raw);
    match interrupt_for(&text) {
        Some(interrupt) => Err(interrupt.into()),
        None => Ok(text),
    }
}

pub fn interrupt_for(text: &str) -> Option<PromptInterrupt> {
    match text.trim().to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => Some(PromptInterrupt::Quit),
        "reset" => Some(PromptInterrupt::Reset),
        _ => None,
    }
}

/// Trims whitespace and the quotes terminals add around dragged-in paths.
pub fn clean_path_text(raw: &str) -> String {
    let text = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    text.to_string()
}
