use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::commands::Cli;
use super::repl::{self, Repl};
use crate::config::Config;
use crate::entity::{RequiredField, ToolSpecification};
use crate::error::{EduforgeError, Result};
use crate::gateway::{GenerationBackend, ImageInput, OpenAiBackend};
use crate::preview::{self, PreviewState};
use crate::prompt::{Locale, PromptCompiler};
use crate::session::{Event, Outcome, Session, Studio};
use crate::storage::ArtifactStore;
use crate::warnings::{self, Warning};

/// Resolve configuration from file, environment and global flags.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    debug!(output_dir = %config.output_dir.display(), locale = %config.locale, "config resolved");
    Ok(config)
}

fn compiler(config: &Config) -> PromptCompiler {
    PromptCompiler::new(config.locale, config.max_request_bytes)
}

fn print_warnings(list: &[Warning]) {
    for w in list {
        eprintln!("{}", warnings::format_warning(w));
    }
}

/// One line per missing field, then the aggregate notice.
pub(crate) fn missing_field_report(locale: Locale, missing: &[RequiredField]) -> Vec<String> {
    let mut lines: Vec<String> = missing.iter().map(|f| f.missing_message(locale)).collect();
    lines.push(locale.texts().missing_fields_warning.to_string());
    lines
}

/// Print per-field messages for an invalid specification and return the
/// matching error.
fn check_complete(spec: &ToolSpecification, locale: Locale) -> Result<()> {
    let missing = spec.missing_fields();
    if missing.is_empty() {
        return Ok(());
    }
    for line in missing_field_report(locale, &missing) {
        eprintln!("  {}", line);
    }
    Err(EduforgeError::Validation { missing })
}

fn save_zip<B: GenerationBackend>(studio: &Studio<B>) -> Result<()> {
    let zip_path = studio.archive()?;
    println!("Archived {}", zip_path.display());
    Ok(())
}

pub fn handle_new(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(EduforgeError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        )));
    }

    ToolSpecification::template().export(&path)?;
    println!("Wrote template specification to {}", path.display());
    Ok(())
}

pub fn handle_validate(config: &Config, spec: PathBuf) -> Result<()> {
    let spec = ToolSpecification::import(&spec)?;
    check_complete(&spec, config.locale)?;
    print_warnings(&warnings::check_specification(&spec));

    println!(
        "OK: \"{}\" ({} interaction rule(s))",
        spec.title.trim(),
        spec.qualifying_rules().count()
    );
    Ok(())
}

pub fn handle_prompt(config: &Config, spec: PathBuf, json: bool) -> Result<()> {
    let spec = ToolSpecification::import(&spec)?;
    check_complete(&spec, config.locale)?;
    print_warnings(&warnings::check_specification(&spec));

    let request = compiler(config).compose(&spec)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&request)?);
    } else {
        println!("--- instruction ---\n{}\n", request.instruction);
        println!("--- content ---\n{}", request.content);
    }
    Ok(())
}

pub fn handle_generate(
    config: &Config,
    spec: PathBuf,
    scene: Option<PathBuf>,
    zip: bool,
) -> Result<()> {
    let spec = ToolSpecification::import(&spec)?;
    check_complete(&spec, config.locale)?;
    let image = scene.as_deref().map(ImageInput::from_path).transpose()?;

    let backend = OpenAiBackend::from_config(&config.backend)?;
    let session = Session::new(compiler(config)).with_specification(spec);
    let mut studio = Studio::new(session, backend, ArtifactStore::new(&config.output_dir));

    if let Some(image) = image {
        match studio.dispatch(Event::DescribeImage(image))? {
            Outcome::Described(text) if !text.is_empty() => {
                println!("Scene: {}", text);
                studio.dispatch(Event::AcceptScene)?;
            }
            _ => eprintln!("Warning: the image description came back empty"),
        }
    }

    eprintln!("Generating with {}...", studio.backend().model());
    let outcome = studio.dispatch(Event::Submit);
    print_warnings(&studio.take_warnings());

    if let Outcome::Generated(artifact) = outcome? {
        println!("Saved {}", artifact.document_path().display());
    }
    if zip {
        save_zip(&studio)?;
    }
    Ok(())
}

pub fn handle_revise(
    config: &Config,
    artifact: PathBuf,
    instruction: String,
    zip: bool,
) -> Result<()> {
    let mut store = ArtifactStore::new(&config.output_dir);
    let artifact = store.adopt(&artifact)?;
    let compiler = compiler(config);
    // Refuse blank or oversized requests before a backend is needed.
    compiler.revise(&artifact.content, &instruction)?;

    let backend = OpenAiBackend::from_config(&config.backend)?;
    let session = Session::new(compiler).resume(artifact);
    let mut studio = Studio::new(session, backend, store);

    eprintln!("Revising with {}...", studio.backend().model());
    let outcome = studio.dispatch(Event::Instruct(instruction));
    print_warnings(&studio.take_warnings());

    if let Outcome::Generated(artifact) = outcome? {
        println!("Saved {}", artifact.document_path().display());
    }
    if zip {
        save_zip(&studio)?;
    }
    Ok(())
}

pub fn handle_describe(config: &Config, image: PathBuf) -> Result<()> {
    let image = ImageInput::from_path(&image)?;
    let backend = OpenAiBackend::from_config(&config.backend)?;
    let request = compiler(config).describe(image);

    let text = backend.describe_image(&request)?;
    println!("{}", text.trim());
    Ok(())
}

pub fn handle_archive(config: &Config, artifact: PathBuf) -> Result<()> {
    let store = ArtifactStore::new(&config.output_dir);
    let zip_path = store.archive(&artifact)?;
    println!("Archived {}", zip_path.display());
    Ok(())
}

pub fn handle_list(config: &Config, json: bool) -> Result<()> {
    let store = ArtifactStore::new(&config.output_dir);
    let summaries = store.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else if summaries.is_empty() {
        println!("No saved tools in {}.", store.root().display());
    } else {
        println!("Saved tools:\n");
        for s in summaries {
            let zipped = if s.archive.is_some() { " [zip]" } else { "" };
            println!(
                "  {}  {}{}",
                s.created_at.format("%Y-%m-%d %H:%M:%S"),
                s.name,
                zipped
            );
        }
    }
    Ok(())
}

pub fn handle_studio(config: &Config, spec: Option<PathBuf>) -> Result<()> {
    let specification = match spec.as_deref() {
        Some(path) => ToolSpecification::import(path)?,
        None => ToolSpecification::default(),
    };
    let backend = OpenAiBackend::from_config(&config.backend)?;
    let session = Session::new(compiler(config)).with_specification(specification);
    let studio = Studio::new(session, backend, ArtifactStore::new(&config.output_dir));

    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut repl = Repl::new(studio, interactive);
    if interactive {
        writeln!(stdout.lock(), "{}", repl::HELP)?;
    }
    repl.run(stdin.lock(), &mut stdout.lock())
}

pub fn handle_preview(config: &Config, artifact: Option<PathBuf>, port: u16) -> Result<()> {
    let pinned = match artifact {
        Some(dir) => Some(pinned_dir(&config.output_dir, &dir)?),
        None => None,
    };
    preview::run(PreviewState::new(&config.output_dir, pinned), port)
}

fn pinned_dir(root: &Path, dir: &Path) -> Result<PathBuf> {
    ArtifactStore::new(root).load(dir)?;
    Ok(dir.to_path_buf())
}
