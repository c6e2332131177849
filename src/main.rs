//! inkpress - themed Markdown to HTML

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use inkpress::{ConversionRequest, Converter, Mode, ThemeStore};

#[derive(Parser)]
#[command(name = "inkpress")]
#[command(version, about = "Themed Markdown to HTML converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    inkpress convert post.md                     Preview HTML on stdout
    inkpress convert post.md --mode publish      Inline-styled fragment
    inkpress convert - --theme purple -o out.html
    inkpress themes --json                       List available themes")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a Markdown file
    Convert {
        /// Markdown input file, or `-` for stdin
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Theme id
        #[arg(short, long, default_value = inkpress::DEFAULT_THEME_ID)]
        theme: String,

        /// Target rendering context
        #[arg(short, long, value_enum, default_value_t = Mode::Preview)]
        mode: Mode,

        /// Theme directory (defaults to $INKPRESS_THEMES_DIR or the bundled themes)
        #[arg(long, value_name = "DIR")]
        themes_dir: Option<PathBuf>,

        /// Print the rendered document as JSON
        #[arg(long)]
        json: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// List available themes
    Themes {
        /// Theme directory (defaults to $INKPRESS_THEMES_DIR or the bundled themes)
        #[arg(long, value_name = "DIR")]
        themes_dir: Option<PathBuf>,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Convert {
            input,
            theme,
            mode,
            themes_dir,
            json,
            output,
        } => convert(&input, theme, mode, themes_dir, json, output.as_deref()),
        Command::Themes { themes_dir, json } => list_themes(themes_dir, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "inkpress=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Build the store, failing only when an explicit directory is unreadable.
fn theme_store(dir: Option<PathBuf>) -> inkpress::Result<ThemeStore> {
    let store = match dir {
        Some(dir) => {
            let store = ThemeStore::new(dir);
            store.try_load()?;
            store
        }
        None => ThemeStore::from_env(),
    };
    store.load();
    Ok(store)
}

fn convert(
    input: &Path,
    theme: String,
    mode: Mode,
    themes_dir: Option<PathBuf>,
    json: bool,
    output: Option<&Path>,
) -> inkpress::Result<()> {
    let markdown = read_input(input)?;
    let store = theme_store(themes_dir)?;
    if !store.contains(&theme) {
        tracing::warn!(theme = %theme, "unknown theme; using default");
    }

    let converter = Converter::new(store);
    let doc = converter.convert(&ConversionRequest::new(markdown, theme, mode));

    let mut rendered = if json {
        serde_json::to_string_pretty(&doc)?
    } else {
        doc.to_html()
    };
    rendered.push('\n');
    write_output(output, &rendered)
}

fn list_themes(themes_dir: Option<PathBuf>, json: bool) -> inkpress::Result<()> {
    let store = theme_store(themes_dir)?;
    let themes = store.list();

    let rendered = if json {
        serde_json::to_string_pretty(&themes)? + "\n"
    } else {
        let width = themes.iter().map(|t| t.id.len()).max().unwrap_or(0);
        themes
            .iter()
            .map(|theme| format!("{:width$}  {}\n", theme.id, theme.display_name))
            .collect()
    };
    write_output(None, &rendered)
}

fn read_input(path: &Path) -> inkpress::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(fs::read_to_string(path)?)
}

fn write_output(path: Option<&Path>, contents: &str) -> inkpress::Result<()> {
    match path {
        Some(path) => fs::write(path, contents)?,
        None => io::stdout().lock().write_all(contents.as_bytes())?,
    }
    Ok(())
}
