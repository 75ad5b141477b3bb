//! Line-oriented driver for the studio wizard.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::handlers::missing_field_report;
use crate::entity::{InteractionRule, RequiredField, ToolSpecification};
use crate::error::{EduforgeError, Result};
use crate::gateway::{GenerationBackend, ImageInput};
use crate::session::{Event, Outcome, SpecEdit, Studio, TurnOutcome, WizardStep};
use crate::warnings::format_warning;

pub const HELP: &str = "\
Commands:
  :set <title|audience|description|initial|extras> <text>
  :rule <if> => <first> [=> <next> ...]   add an interaction rule
  :rule rm <n>                            remove rule n
  :import <file>   :export <file>
  :describe <image>   :accept   :discard
  :generate   :chat   :back   :reset
  :zip   :show   :help   :quit
In the conversation step, any other line is an instruction.";

#[derive(Debug, PartialEq)]
enum Command {
    Set(SpecEdit),
    Rule(InteractionRule),
    RemoveRule(usize),
    Import(PathBuf),
    Export(PathBuf),
    Describe(PathBuf),
    Accept,
    Discard,
    Generate,
    Chat,
    Back,
    Reset,
    Zip,
    Show,
    Help,
    Quit,
    Say(String),
}

fn parse(line: &str) -> std::result::Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let need = |what: &str| format!("Usage: :{} {}", name, what);

    let command = match name {
        "set" => {
            let (field, value) = arg
                .split_once(char::is_whitespace)
                .ok_or_else(|| need("<field> <text>"))?;
            let value = value.trim().to_string();
            if field.eq_ignore_ascii_case("extras") {
                Command::Set(SpecEdit::Extras(value))
            } else {
                Command::Set(SpecEdit::Field(field.parse::<RequiredField>()?, value))
            }
        }
        "rule" => {
            let removal = match arg.split_once(char::is_whitespace) {
                Some(("rm", n)) => Some(n),
                _ if arg == "rm" => Some(""),
                _ => None,
            };
            if let Some(n) = removal {
                let n: usize = n.trim().parse().map_err(|_| need("rm <n>"))?;
                if n == 0 {
                    return Err(need("rm <n> (rules are numbered from 1)"));
                }
                Command::RemoveRule(n - 1)
            } else {
                let mut parts = arg.split("=>").map(str::trim);
                let condition = parts.next().unwrap_or_default();
                let first = parts.next().ok_or_else(|| need("<if> => <first>"))?;
                let mut rule = InteractionRule::new(condition, first);
                rule.subsequent_responses = parts.map(str::to_string).collect();
                Command::Rule(rule)
            }
        }
        "import" | "export" | "describe" if arg.is_empty() => return Err(need("<file>")),
        "import" => Command::Import(PathBuf::from(arg)),
        "export" => Command::Export(PathBuf::from(arg)),
        "describe" => Command::Describe(PathBuf::from(arg)),
        "accept" => Command::Accept,
        "discard" => Command::Discard,
        "generate" => Command::Generate,
        "chat" => Command::Chat,
        "back" => Command::Back,
        "reset" => Command::Reset,
        "zip" => Command::Zip,
        "show" => Command::Show,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command :{} (try :help)", other)),
    };
    Ok(Some(command))
}

/// Reads commands and feeds them to a [`Studio`]. Errors are printed and
/// the loop keeps going.
pub struct Repl<B> {
    studio: Studio<B>,
    interactive: bool,
}

impl<B: GenerationBackend> Repl<B> {
    pub fn new(studio: Studio<B>, interactive: bool) -> Self {
        Self {
            studio,
            interactive,
        }
    }

    pub fn studio(&self) -> &Studio<B> {
        &self.studio
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        let mut lines = input.lines();
        loop {
            if self.interactive {
                write!(out, "{}> ", self.studio.session().step())?;
                out.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;

            match parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command, out) {
                        self.report(&e, out)?;
                    }
                }
                Err(message) => writeln!(out, "{}", message)?,
            }

            for w in self.studio.take_warnings() {
                writeln!(out, "{}", format_warning(&w))?;
            }
        }
        Ok(())
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Set(edit) => {
                self.studio.dispatch(Event::Edit(edit))?;
            }
            Command::Rule(rule) => {
                self.studio.dispatch(Event::Edit(SpecEdit::AddRule(rule)))?;
                let count = self.studio.session().specification().interaction_rules.len();
                writeln!(out, "Rule {} added.", count)?;
            }
            Command::RemoveRule(index) => {
                self.studio
                    .dispatch(Event::Edit(SpecEdit::RemoveRule(index)))?;
                writeln!(out, "Rule {} removed.", index + 1)?;
            }
            Command::Import(path) => {
                let spec = ToolSpecification::import(&path)?;
                self.studio.dispatch(Event::Import(spec))?;
                writeln!(out, "Imported {}", path.display())?;
            }
            Command::Export(path) => {
                self.studio.session().specification().export(&path)?;
                writeln!(out, "Exported to {}", path.display())?;
            }
            Command::Describe(path) => {
                let image = ImageInput::from_path(&path)?;
                writeln!(out, "Describing {}...", path.display())?;
                if let Outcome::Described(text) =
                    self.studio.dispatch(Event::DescribeImage(image))?
                {
                    if text.is_empty() {
                        writeln!(out, "The description came back empty.")?;
                    } else {
                        writeln!(out, "Scene: {}", text)?;
                        writeln!(out, "(:accept adds it to the initial view, :discard drops it)")?;
                    }
                }
            }
            Command::Accept => {
                self.studio.dispatch(Event::AcceptScene)?;
                writeln!(out, "Scene added to the initial view.")?;
            }
            Command::Discard => {
                self.studio.dispatch(Event::DiscardScene)?;
            }
            Command::Generate => {
                writeln!(out, "Generating...")?;
                self.generated(Event::Submit, out)?;
            }
            Command::Chat => {
                self.studio.dispatch(Event::EnterConverse)?;
                writeln!(out, "Describe a change, or :back to return to the preview.")?;
            }
            Command::Back => {
                self.studio.dispatch(Event::Back)?;
            }
            Command::Reset => {
                self.studio.dispatch(Event::Reset)?;
                writeln!(out, "Started over.")?;
            }
            Command::Zip => {
                let zip_path = self.studio.archive()?;
                writeln!(out, "Archived {}", zip_path.display())?;
            }
            Command::Show => self.show(out)?,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Say(text) => {
                if self.studio.session().step() == WizardStep::Converse {
                    writeln!(out, "Revising...")?;
                    self.generated(Event::Instruct(text), out)?;
                } else {
                    writeln!(out, "Instructions are taken after :chat. Try :help.")?;
                }
            }
            Command::Quit => {}
        }
        Ok(())
    }

    fn generated<W: Write>(&mut self, event: Event, out: &mut W) -> Result<()> {
        if let Outcome::Generated(artifact) = self.studio.dispatch(event)? {
            writeln!(out, "Saved {}", artifact.document_path().display())?;
        }
        Ok(())
    }

    fn show<W: Write>(&self, out: &mut W) -> Result<()> {
        let session = self.studio.session();
        writeln!(out, "Step: {}", session.step())?;
        writeln!(out, "{}", session.specification().to_json_pretty()?)?;
        match session.current_location() {
            Some(location) => writeln!(out, "Current: {}", location.display())?,
            None => writeln!(out, "Current: (nothing generated yet)")?,
        }
        if let Some(scene) = session.pending_scene() {
            writeln!(out, "Pending scene: {}", scene)?;
        }
        for (i, turn) in session.history().iter().enumerate() {
            let status = match &turn.outcome {
                TurnOutcome::Pending => "pending".to_string(),
                TurnOutcome::Applied(location) => format!("-> {}", location.display()),
                TurnOutcome::Failed(message) => format!("failed: {}", message),
            };
            writeln!(out, "  {}. {} [{}]", i + 1, turn.instruction, status)?;
        }
        Ok(())
    }

    fn report<W: Write>(&self, error: &EduforgeError, out: &mut W) -> Result<()> {
        match error {
            EduforgeError::Validation { missing } => {
                let locale = self.studio.session().compiler().locale;
                for line in missing_field_report(locale, missing) {
                    writeln!(out, "{}", line)?;
                }
            }
            other => writeln!(out, "Error: {}", other)?,
        }
        Ok(())
    }
}
