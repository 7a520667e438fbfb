//! Command-line surface. Every subcommand except `serve` runs once against
//! the local store and exits.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::export::{export_to_file, slugify, ExportFormat};
use crate::generation::generator::{generate, GenerateRequest};
use crate::generation::reference::{extract_text, normalize};
use crate::models::{ContentKind, ContentRequest};
use crate::profile::{self, auth::run_key_setup, form::run_form, ProfileFormat};
use crate::state::AppState;
use crate::store::DEFAULT_HISTORY_LIMIT;

#[derive(Debug, Parser)]
#[command(
    name = "cvgenx",
    version,
    about = "Generate tailored resumes and cover letters from a job description"
)]
pub struct Cli {
    /// Delete the local database before starting
    #[arg(long, global = true)]
    pub reset_db: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Generate documents for a job description
    Generate {
        /// File with the job description. Read from stdin when omitted
        job_description: Option<PathBuf>,
        /// What to generate
        #[arg(short = 't', long = "type", value_enum)]
        content: ContentRequest,
        /// Also write each document in this format
        #[arg(short = 'o', long, value_enum, default_value = "md")]
        output_format: ExportFormat,
        /// Existing resume (pdf, docx or text) to use as reference
        #[arg(short, long)]
        reference: Option<PathBuf>,
        /// Saved profile to use instead of the default one
        #[arg(long)]
        profile_id: Option<i64>,
        /// Directory the files are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Set up the provider API key interactively
    Auth,
    /// Show, edit or import the default profile
    Profile {
        #[command(subcommand)]
        sub: ProfileCommands,
    },
    /// Inspect and manage generation history
    History {
        #[command(subcommand)]
        sub: HistoryCommands,
    },
    /// Convert a markdown file to PDF or DOCX
    Export {
        /// Markdown file to convert
        input: PathBuf,
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: ExportFormat,
        /// Output path. Defaults to the input path with the format's extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    /// Print the profile
    Show {
        #[arg(short, long, value_enum, default_value = "json")]
        format: ProfileFormat,
    },
    /// Edit the profile field by field
    Edit,
    /// Replace the profile with a .json, .yaml or .yml file
    Import { file: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommands {
    /// List recent generations, newest first
    List {
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: i64,
    },
    /// Print the output of one generation
    Show { id: i64 },
    /// Replace the output of a generation with the contents of a file
    Update { id: i64, file: PathBuf },
    /// Delete a generation
    Delete { id: i64 },
}

/// `<slug(name)>-<kind>.<ext>`, leaving out the name when it slugs to nothing.
pub fn output_file_name(name: &str, kind: ContentKind, extension: &str) -> String {
    let stem = [slugify(name), kind.as_str().to_string()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    format!("{stem}.{extension}")
}

/// Runs a one-shot subcommand. `Serve` is handled by the caller.
pub async fn run(command: Commands, state: &AppState) -> Result<()> {
    match command {
        Commands::Serve => Ok(()),
        Commands::Generate {
            job_description,
            content,
            output_format,
            reference,
            profile_id,
            out_dir,
        } => {
            run_generate(
                state,
                job_description.as_deref(),
                content,
                output_format,
                reference.as_deref(),
                profile_id,
                &out_dir,
            )
            .await
        }
        Commands::Auth => {
            let mut input = io::stdin().lock();
            let mut output = io::stdout();
            run_key_setup(&mut input, &mut output, &state.store, state.provider.as_ref()).await?;
            Ok(())
        }
        Commands::Profile { sub } => run_profile(state, sub).await,
        Commands::History { sub } => run_history(state, sub).await,
        Commands::Export {
            input,
            format,
            output,
        } => {
            let markdown = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let output = output.unwrap_or_else(|| input.with_extension(format.extension()));
            export_to_file(format, &markdown, &output)
                .await
                .with_context(|| format!("Failed to export {}", input.display()))?;
            println!("Saved to {}", output.display());
            Ok(())
        }
    }
}

async fn read_job_description(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            eprintln!("Paste the job description below. Press Ctrl+D when done:");
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read the job description from stdin")?;
            Ok(text)
        }
    }
}

async fn read_reference(path: &Path) -> Result<String> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text = tokio::task::spawn_blocking(move || {
        extract_text(&filename, "", &data).map(|t| normalize(&t))
    })
    .await
    .context("Reference extraction task failed")??;
    Ok(text)
}

async fn run_generate(
    state: &AppState,
    job_description: Option<&Path>,
    content: ContentRequest,
    output_format: ExportFormat,
    reference: Option<&Path>,
    profile_id: Option<i64>,
    out_dir: &Path,
) -> Result<()> {
    let job_description = read_job_description(job_description).await?;
    if job_description.trim().is_empty() {
        println!("No job description provided.");
        return Ok(());
    }

    let mut request = GenerateRequest::new(job_description.trim(), content);
    request.profile_id = profile_id;
    if let Some(path) = reference {
        request.resume_text = Some(read_reference(path).await?);
    }

    let name = match profile_id {
        Some(id) => state.store.get_profile(id).await?.data.name,
        None => state.store.get_config().await?.profile.name,
    };

    eprintln!("Generating with {}...", state.provider.name());
    let records = generate(
        &state.store,
        state.provider.as_ref(),
        &state.config.default_model,
        &request,
    )
    .await?;

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for record in &records {
        let markdown_path = out_dir.join(output_file_name(&name, record.kind, "md"));
        tokio::fs::write(&markdown_path, &record.output)
            .await
            .with_context(|| format!("Failed to write {}", markdown_path.display()))?;

        let saved = if output_format == ExportFormat::Markdown {
            markdown_path
        } else {
            let path = out_dir.join(output_file_name(
                &name,
                record.kind,
                output_format.extension(),
            ));
            export_to_file(output_format, &record.output, &path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path
        };
        info!("Generation {} written to {}", record.id, saved.display());
        println!("Saved to {}", saved.display());
    }
    Ok(())
}

async fn run_profile(state: &AppState, sub: ProfileCommands) -> Result<()> {
    match sub {
        ProfileCommands::Show { format } => {
            let config = state.store.get_config().await?;
            println!("{}", profile::render_profile(&config.profile, format)?);
        }
        ProfileCommands::Edit => {
            let current = state.store.get_config().await?.profile;
            let edited = {
                let mut input = io::stdin().lock();
                let mut output = io::stdout();
                run_form(&mut input, &mut output, current)?
            };
            state.store.save_profile_snapshot(edited).await?;
            println!("Profile saved.");
        }
        ProfileCommands::Import { file } => {
            let imported = profile::read_profile_file(&file).await?;
            state.store.save_profile_snapshot(imported).await?;
            println!("Imported profile from {}", file.display());
        }
    }
    Ok(())
}

async fn run_history(state: &AppState, sub: HistoryCommands) -> Result<()> {
    match sub {
        HistoryCommands::List { limit } => {
            let records = state.store.list_generations(limit).await?;
            if records.is_empty() {
                println!("No generations yet.");
            }
            let mut out = io::stdout().lock();
            for record in records {
                let summary: String = record
                    .job_description
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .chars()
                    .take(60)
                    .collect();
                writeln!(
                    out,
                    "{:>5}  {:<12} {}  {}",
                    record.id,
                    record.kind.as_str(),
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    summary
                )?;
            }
        }
        HistoryCommands::Show { id } => {
            println!("{}", state.store.get_generation(id).await?.output);
        }
        HistoryCommands::Update { id, file } => {
            let output = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            state.store.update_generation(id, &output).await?;
            println!("Updated generation {id}");
        }
        HistoryCommands::Delete { id } => {
            state.store.delete_generation(id).await?;
            println!("Deleted generation {id}");
        }
    }
    Ok(())
}
