use clap::{Parser, Subcommand};
use notes_press::build::{self, BuildMode};
use notes_press::{config, output};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("NOTES_PRESS_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("NOTES_PRESS_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "notes-press")]
#[command(about = "Static site generator for multilingual Markdown notes")]
#[command(long_about = "\
Static site generator for multilingual Markdown notes

Each language version of the site is a directory of Markdown notes and the
files they reference. Every note, image and attachment must be linked from
somewhere, and every version must carry the same pages.

Project structure:

  blog/
  ├── config.toml          # Site config (domains, versions, assets)
  ├── index.html           # Static files listed in static_files
  ├── en/                  # One directory per version
  │   ├── index.md         # Home page ([[blogTotalNumber]] = page count)
  │   ├── blogs.json       # Publish-date snapshot (kept by production builds)
  │   ├── posts/hello.md   # Note → dist/en/posts/hello.html
  │   └── img/cat.png      # Referenced as /en/img/cat.png
  └── zh/
      └── ...

Every note starts with YAML front-matter holding title, keywords,
description and changefreq (hourly, daily, weekly, monthly, yearly, never).

Run 'notes-press gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root holding config.toml and the version directories
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Build mode; `production` selects production, anything else development
    #[arg(long, env = "MODE", default_value = "development", global = true)]
    mode: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate every version and write the site
    Build,
    /// Run every validation without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mode = BuildMode::from_label(&cli.mode);
    log::debug!("mode: {}", mode.as_str());

    match cli.command {
        Command::Build => {
            println!("==> Building {} ({})", cli.root.display(), mode.as_str());
            let site = build::build_site(&cli.root, mode)?;
            output::print_build_output(&site);
        }
        Command::Check => {
            println!("==> Checking {}", cli.root.display());
            let site = build::check_site(&cli.root, mode)?;
            output::print_check_output(&site);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
