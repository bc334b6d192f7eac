use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event as CEvent};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use sendyprep::config::Config;
use sendyprep::core::{ColumnConfig, ColumnId};
use sendyprep::error::Operation;
use sendyprep::services::{ApiClient, ExportController, IntakeController, Session};
use sendyprep::tui::App;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{error, info};

/// Prepare contact lists for Sendy: upload a CSV, choose and rename columns,
/// download the processed file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level for the log file; takes priority over RUST_LOG
    #[arg(long = "logging", value_enum, global = true)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Backend base URL, e.g. http://localhost:8080
    #[arg(long = "server", value_name = "URL", global = true)]
    server: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a CSV file and print its columns and the first rows
    Preview {
        file: PathBuf,
    },
    /// Upload a CSV file, apply column edits and save the processed file
    Download(DownloadArgs),
    /// Interactive session; FILE is uploaded on start
    Tui {
        file: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct DownloadArgs {
    file: PathBuf,
    /// Directory the processed file is saved into
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    #[arg(long, value_name = "NAME")]
    tag_name: Option<String>,
    /// Defaults to the file name without `.csv`
    #[arg(long, value_name = "VALUE")]
    tag_value: Option<String>,
    /// Do not ask the server to drop duplicate contacts
    #[arg(long)]
    keep_duplicates: bool,
    /// Ask the server to drop rows without contact data
    #[arg(long)]
    remove_empty: bool,
    /// Rename a column, e.g. --rename city=Town
    #[arg(long = "rename", value_name = "ORIG=NEW", value_parser = parse_rename)]
    rename: Vec<(String, String)>,
    /// Leave a column out of the export
    #[arg(long = "exclude", value_name = "ORIG")]
    exclude: Vec<String>,
    /// Add a column that is excluded by default
    #[arg(long = "include", value_name = "ORIG")]
    include: Vec<String>,
    /// Put these columns first, in this order
    #[arg(long = "order", value_name = "ORIG,ORIG,...", value_delimiter = ',')]
    order: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn parse_rename(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((original, display)) if !original.is_empty() && !display.is_empty() => {
            Ok((original.to_string(), display.to_string()))
        }
        _ => Err(format!("expected ORIG=NEW, got '{s}'")),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    sendyprep::logging::init_with(None, args.logging.map(LogLevel::to_level))?;

    let mut config = Config::from_path(args.config.as_ref())?;
    if let Some(server) = args.server {
        config.api.base_url = server;
    }
    info!("Using server {}", config.api.base_url);

    let runtime = Runtime::new()?;
    match args.command {
        Command::Preview { file } => runtime.block_on(preview(&config, &file)),
        Command::Download(download_args) => runtime.block_on(download(&config, download_args)),
        Command::Tui { file } => run_tui(&config, &runtime, file),
    }
}

async fn upload(client: &ApiClient, config: &Config, file: &Path) -> Result<Session> {
    let mut session = Session::new(config.download.options());
    IntakeController::new(client.clone())
        .process_file(&mut session, file)
        .await
        .map_err(|e| eyre!(Operation::Upload.alert(&e)))?;
    Ok(session)
}

async fn preview(config: &Config, file: &Path) -> Result<()> {
    let client = ApiClient::new(&config.api)?;
    let session = upload(&client, config, file).await?;

    println!("Columns:");
    for column in session.columns().descriptors() {
        let marker = if column.included() { "[x]" } else { "[ ]" };
        println!(
            "  {marker} {:<24} -> {}",
            column.original_name(),
            column.display_name()
        );
    }
    println!();
    if let Some(grid) = session.preview() {
        print!("{grid}");
    }
    Ok(())
}

async fn download(config: &Config, args: DownloadArgs) -> Result<()> {
    let client = ApiClient::new(&config.api)?;
    let mut session = upload(&client, config, &args.file).await?;

    apply_column_edits(&mut session, &args)?;
    let options = session.options_mut();
    if let Some(name) = &args.tag_name {
        options.tag_name = name.clone();
    }
    if let Some(value) = &args.tag_value {
        options.tag_value = value.clone();
    }
    if args.keep_duplicates {
        options.remove_duplicates = false;
    }
    if args.remove_empty {
        options.remove_empty = true;
    }

    let dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.download.output_dir.clone());
    let path = ExportController::new(client)
        .download_into(&mut session, &dir)
        .await
        .map_err(|e| eyre!(Operation::Download.alert(&e)))?;
    println!("Saved {}", path.display());
    Ok(())
}

fn column_id(columns: &ColumnConfig, original_name: &str) -> Result<ColumnId> {
    columns
        .find_by_original_name(original_name)
        .map(|c| c.id())
        .ok_or_else(|| eyre!("unknown column '{original_name}'"))
}

/// Listed columns first in the given order, the rest after them unchanged
fn ordered_ids(columns: &ColumnConfig, names: &[String]) -> Result<Vec<ColumnId>> {
    let mut ids = names
        .iter()
        .map(|name| column_id(columns, name))
        .collect::<Result<Vec<_>>>()?;
    for id in columns.ordered_ids() {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn apply_column_edits(session: &mut Session, args: &DownloadArgs) -> Result<()> {
    for name in &args.exclude {
        let id = column_id(session.columns(), name)?;
        session
            .set_included(id, false)
            .wrap_err_with(|| format!("cannot exclude '{name}'"))?;
    }
    for name in &args.include {
        let id = column_id(session.columns(), name)?;
        session.set_included(id, true)?;
    }
    for (original, display) in &args.rename {
        let id = column_id(session.columns(), original)?;
        session
            .set_display_name(id, display.clone())
            .wrap_err_with(|| format!("cannot rename '{original}'"))?;
    }
    if !args.order.is_empty() {
        let ids = ordered_ids(session.columns(), &args.order)?;
        session.reorder(&ids).wrap_err("invalid --order")?;
    }
    Ok(())
}

fn run_tui(config: &Config, runtime: &Runtime, file: Option<PathBuf>) -> Result<()> {
    let mut app = App::new(config, runtime.handle().clone())?;
    if let Some(path) = file {
        app.open_file(&path);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste)?;
    terminal.show_cursor()?;
    if let Err(e) = &res {
        error!("Error: {e}");
    }
    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.drain_task_events();
        terminal.draw(|f| app.render(f))?;
        if app.should_quit() {
            return Ok(());
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                CEvent::Key(key) => app.handle_key_event(key)?,
                CEvent::Paste(text) => app.handle_paste(&text),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> ColumnConfig {
        let headers: Vec<String> = ["first_name", "email", "city", "zip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        ColumnConfig::initialize(&headers)
    }

    #[test]
    fn test_parse_rename() {
        assert_eq!(
            parse_rename("city=Town").unwrap(),
            ("city".to_string(), "Town".to_string())
        );
        assert_eq!(
            parse_rename("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_rename("city").is_err());
        assert!(parse_rename("=Town").is_err());
    }

    #[test]
    fn test_ordered_ids_keeps_unlisted_order() {
        let columns = columns();
        let ids = ordered_ids(&columns, &["zip".to_string(), "email".to_string()]).unwrap();
        let names: Vec<&str> = ids
            .iter()
            .map(|id| columns.get(*id).unwrap().original_name())
            .collect();
        assert_eq!(names, vec!["zip", "email", "first_name", "city"]);
    }

    #[test]
    fn test_ordered_ids_unknown_column() {
        assert!(ordered_ids(&columns(), &["phone".to_string()]).is_err());
    }

    #[test]
    fn test_cli_parses_download_flags() {
        let args = Args::parse_from([
            "sendyprep",
            "--server",
            "http://example.test",
            "download",
            "list.csv",
            "--rename",
            "city=Town",
            "--order",
            "email,first_name",
            "--keep-duplicates",
        ]);
        assert_eq!(args.server.as_deref(), Some("http://example.test"));
        let Command::Download(dl) = args.command else {
            panic!("expected download");
        };
        assert_eq!(dl.rename, vec![("city".to_string(), "Town".to_string())]);
        assert_eq!(dl.order, vec!["email", "first_name"]);
        assert!(dl.keep_duplicates);
        assert!(!dl.remove_empty);
    }
}
