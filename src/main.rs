use clap::{Parser, Subcommand};
use inkpress::document::Document;
use inkpress::naming::slugify;
use inkpress::{config, output, pipeline};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "inkpress")]
#[command(about = "Static site generator for markdown blogs")]
#[command(long_about = "\
Static site generator for markdown blogs

Markdown files with a YAML header become minified HTML pages. One page is
the index: it lists every other page, newest first.

Site structure:

  site.yaml                  # Config: name, in, out, css-merge-order, ...
  site/
  ├── src/                   # Pages
  │   ├── index.md           # `index: true` - the listing page
  │   └── hello_world.md     # `title: Hello World`, `added: <unix seconds>`
  ├── css/                   # Merged into all.css in css-merge-order
  ├── img/                   # Copied as-is
  ├── fonts/                 # Copied as-is
  └── tmp/page               # Handlebars page template

Run 'inkpress gen-config' to generate a documented site.yaml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every page, the index, the stylesheet and assets
    Build {
        /// Path to the site config file
        config: PathBuf,
    },
    /// Interactively create a new source page
    NewPage {
        /// Path to the site config file
        config: PathBuf,
    },
    /// Print a stock site.yaml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", output::format_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Build { config } => build(&config)?,
        Command::NewPage { config } => new_page(&config)?,
        Command::GenConfig => print!("{}", config::stock_config_yaml()),
    }
    Ok(())
}

fn build(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let site = config::load_config(config_path)?;

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            let line = output::format_event(&event);
            if event.is_failure() {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
    });
    let result = pipeline::build(&site, Some(tx));
    // The sender is gone once build returns, so the printer drains and exits
    let _ = printer.join();

    for line in output::format_summary(&result?) {
        println!("{line}");
    }
    Ok(())
}

fn new_page(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let site = config::load_config(config_path)?;
    site.ensure_layout()?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let doc = if ask_yes_no(&mut input, &mut out, "index (y/n): ")? {
        Document::new_index(&site.name)
    } else {
        let title = ask_title(&mut input, &mut out)?;
        Document::new_post(&title, chrono::Utc::now().timestamp())
    };

    let path = doc.create_in(&site.src_dir())?;
    println!("{}", output::format_created(&path));
    Ok(())
}

fn ask(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> io::Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }
    Ok(line.trim().to_string())
}

fn ask_yes_no(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> io::Result<bool> {
    loop {
        match ask(input, out, prompt)?.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}

/// Ask until the title yields a usable file name.
fn ask_title(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<String> {
    loop {
        let title = ask(input, out, "title: ")?;
        if !slugify(&title).is_empty() {
            return Ok(title);
        }
        writeln!(out, "title needs at least one letter or digit")?;
    }
}
