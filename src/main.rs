use anyhow::{Context, Result};
use blug::build::build_site;
use blug::config::Config;
use blug::create::create_post;
use chrono::Local;
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn dir_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("dir")
        .short("d")
        .long("dir")
        .takes_value(true)
        .value_name("DIR")
        .help("The project directory, or any directory below it [default: .]")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = App::new("blug")
        .version(crate_version!())
        .about("A static blog generator for Markdown based blogs")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("generate")
                .about(
                    "Generates the site. DELETES the output directory first; \
                     anything in it that isn't regenerated is lost.",
                )
                .arg(dir_arg())
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Overrides the configured output directory"),
                ),
        )
        .subcommand(
            SubCommand::with_name("post")
                .about("Creates a new, empty post in the content directory")
                .arg(
                    Arg::with_name("title")
                        .required(true)
                        .index(1)
                        .help("The title of the new post"),
                )
                .arg(dir_arg()),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        eprintln!("{}", report(&err));
        std::process::exit(1);
    }
}

// Goes to stderr directly, independent of the log filter.
fn report(err: &anyhow::Error) -> String {
    format!("error: {:#}", err)
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("generate", Some(m)) => {
            let output = m.value_of("output").map(PathBuf::from);
            let config = load_config(m, output.as_deref())?;
            build_site(&config).context("Generating site")
        }
        ("post", Some(m)) => {
            let config = load_config(m, None)?;
            let title = m.value_of("title").unwrap_or_default();
            let path = create_post(title, &config.content_dir, &Local::now().naive_local())
                .context("Creating post")?;
            info!(path = %path.display(), "created post");
            Ok(())
        }
        _ => Ok(()),
    }
}

fn load_config(matches: &ArgMatches, output: Option<&Path>) -> Result<Config> {
    let dir = Path::new(matches.value_of("dir").unwrap_or("."));
    let dir = dir
        .canonicalize()
        .with_context(|| format!("Resolving project directory '{}'", dir.display()))?;
    Ok(Config::from_directory(&dir, output)?)
}
