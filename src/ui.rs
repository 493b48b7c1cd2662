// UI layer: formats places for the console and asks the yes/no questions
// the selection loop needs. Two prompters are provided: a `dialoguer` one
// for interactive terminals and a plain line reader for piped input.

use std::fmt::Write as _;
use std::io::{BufRead, ErrorKind, Write};
use std::time::Duration;

use dialoguer::console::Term;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::PlaceRecord;
use crate::error::{PickerError, Result};

/// Console surface used by the selection loop.
pub trait Prompter {
    /// Show one candidate.
    fn present(&mut self, place: &PlaceRecord) -> Result<()>;

    /// Ask a yes/no question, re-asking until the answer is valid.
    fn ask_yes_no(&mut self, question: &str) -> Result<bool>;

    /// Print a plain status line.
    fn say(&mut self, message: &str) -> Result<()>;

    fn confirm_selection(&mut self, place: &PlaceRecord) -> Result<bool> {
        self.ask_yes_no(&format!(
            "Is {} acceptable? (input 'y' for yes or 'n' for no): ",
            place.name
        ))
    }
}

/// Map link for a place. Pure string building, no request is made.
#[must_use]
pub fn shareable_link(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
}

/// `y`/`yes` and `n`/`no`, case-insensitive. Anything else is `None`,
/// surrounding whitespace included.
#[must_use]
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Human readable block describing a place, ending with a blank line.
#[must_use]
pub fn format_place(place: &PlaceRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "***  {}  ***", place.name);
    let _ = writeln!(
        out,
        "{}",
        place.formatted_address.as_deref().unwrap_or("Address unknown")
    );

    match place.price_level {
        Some(level) => {
            let _ = writeln!(out, "Price level: {level} out of 3");
        }
        None => out.push_str("Price level unknown\n"),
    }

    match (place.rating, place.user_ratings_total) {
        (Some(rating), Some(total)) => {
            let _ = writeln!(out, "Rated {rating} out of 5 stars (from {total} reviews)");
        }
        (Some(rating), None) => {
            let _ = writeln!(out, "Rated {rating} out of 5 stars");
        }
        (None, _) => out.push_str("Rating unknown\n"),
    }

    match place.open_now() {
        Some(true) => out.push_str("Open now\n"),
        Some(false) => out.push_str("### Currently Closed ###\n"),
        None => {}
    }

    out.push('\n');
    out
}

/// Closing message for an accepted place, link framed by blank lines so
/// it is easy to copy.
#[must_use]
pub fn format_selection(place: &PlaceRecord) -> String {
    format!(
        "Fortunate! Here is a link:\n\n\n{}\n\n",
        shareable_link(&place.place_id)
    )
}

/// Line-oriented prompter over any reader/writer pair. Used when stdin is
/// not a terminal, and in tests.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LinePrompter { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn present(&mut self, place: &PlaceRecord) -> Result<()> {
        self.output
            .write_all(format_place(place).as_bytes())
            .map_err(PickerError::Prompt)
    }

    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            write!(self.output, "{question}").map_err(PickerError::Prompt)?;
            self.output.flush().map_err(PickerError::Prompt)?;

            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(PickerError::Prompt)?;
            if read == 0 {
                return Err(PickerError::InputClosed);
            }

            let answer = line.trim_end_matches(['\r', '\n']);
            match parse_yes_no(answer) {
                Some(choice) => return Ok(choice),
                None => {
                    writeln!(self.output, "Invalid input: {answer}").map_err(PickerError::Prompt)?;
                }
            }
        }
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}").map_err(PickerError::Prompt)
    }
}

/// Interactive prompter backed by `dialoguer`; invalid answers are
/// rejected inline and the question re-asked.
#[derive(Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn present(&mut self, place: &PlaceRecord) -> Result<()> {
        print!("{}", format_place(place));
        Ok(())
    }

    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        // dialoguer appends its own ": " after the prompt.
        let prompt = question.trim_end().trim_end_matches(':');
        let answer: String = Input::new()
            .with_prompt(prompt)
            .validate_with(|input: &String| -> std::result::Result<(), String> {
                parse_yes_no(input)
                    .map(|_| ())
                    .ok_or_else(|| format!("Invalid input: {input}"))
            })
            .interact_text_on(&Term::stdout())
            .map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => PickerError::InputClosed,
                _ => PickerError::Prompt(e),
            })?;
        validated_answer(&answer)
    }

    fn say(&mut self, message: &str) -> Result<()> {
        println!("{message}");
        Ok(())
    }
}

/// Answer that already passed the prompt's validator.
fn validated_answer(answer: &str) -> Result<bool> {
    parse_yes_no(answer).ok_or_else(|| {
        PickerError::Prompt(std::io::Error::new(
            ErrorKind::InvalidData,
            format!("unexpected answer {answer:?}"),
        ))
    })
}

/// Spinner on stderr while a request is in flight. Caller clears it.
pub fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
