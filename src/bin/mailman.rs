#![cfg(not(tarpaulin_include))]

use clap::{Parser, Subcommand};
use mailman::config::MailmanConfig;
use mailman::loader::load_document;
use mailman::mailer::Mailer;
use mailman::merge_template::MergeTemplate;
use mailman::render::{RenderEngine, RenderOptions};
use mailman::spreadsheet::{SheetSource, Workspace};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mailman", about = "Spreadsheet driven mail merge")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template against one spreadsheet row
    Render {
        #[arg(long)]
        template: PathBuf,
        /// CSV files, one sheet each; the first is active
        #[arg(long, required = true, num_args = 1..)]
        data: Vec<PathBuf>,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        header_row: Option<u32>,
        #[arg(long, conflicts_with = "cell")]
        row: Option<u32>,
        /// Select the active cell (A1 notation) instead of giving a row
        #[arg(long)]
        cell: Option<String>,
    },
    /// Render a merge template for every data row
    Merge {
        #[arg(long)]
        merge_template: PathBuf,
        #[arg(long, required = true, num_args = 1..)]
        data: Vec<PathBuf>,
        /// Send through SMTP instead of printing
        #[arg(long)]
        send: bool,
    },
}

/// Entry point for the mailman command line tool
///
/// Loads the configuration (if given), builds a single render engine and runs
/// the selected subcommand. Logging is controlled with `RUST_LOG`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MailmanConfig::load(path)?,
        None => MailmanConfig::default(),
    };
    let engine = RenderEngine::with_config(&config.render);

    match cli.command {
        Command::Render {
            template,
            data,
            sheet,
            header_row,
            row,
            cell,
        } => {
            let text = std::fs::read_to_string(&template)?;
            let mut workspace = Workspace::new();
            workspace.open(load_document("data", &data)?);

            if let Some(cell) = cell {
                let document = workspace.active_document_mut()?;
                if let Some(name) = &sheet {
                    document.set_active_sheet(name)?;
                }
                if !document.active_sheet_mut()?.activate(&cell) {
                    return Err(format!("invalid cell: {}", cell).into());
                }
            }

            let options = RenderOptions {
                sheet_name: sheet,
                header_row_index: header_row,
                data_row_index: row,
                ..Default::default()
            };
            println!("{}", engine.render(&text, &options, &workspace)?);
        }
        Command::Merge {
            merge_template,
            data,
            send,
        } => {
            let template = MergeTemplate::load(&merge_template)?;
            let mut workspace = Workspace::new();
            workspace.open(load_document("data", &data)?);
            log::info!(
                "merging {} from {}",
                template.title,
                workspace.active_document()?.url()
            );
            if !template.timestamp_column.name.is_empty() {
                log::info!(
                    "timestamps are not written back; column would be {}",
                    template.timestamp_column_title()
                );
            }

            let emails = template.render_all(&engine, &workspace)?;
            if send {
                let mailer = Mailer::new(config.smtp()?)?;
                for email in &emails {
                    mailer.send(email)?;
                }
                println!("Sent {} emails", emails.len());
            } else {
                for email in &emails {
                    println!("--- row {} ---", email.row);
                    println!("To: {}", email.to);
                    if !email.cc.is_empty() {
                        println!("Cc: {}", email.cc);
                    }
                    if !email.bcc.is_empty() {
                        println!("Bcc: {}", email.bcc);
                    }
                    println!("Subject: {}", email.subject);
                    println!();
                    println!("{}", email.body);
                }
            }
        }
    }

    Ok(())
}
