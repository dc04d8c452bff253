use anyhow::Result;
use clap::{App, Arg, ArgMatches};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use weaver::build::build;
use weaver::config::Config;
use weaver::serve::serve;

/// Setting this environment variable (to anything) has the same effect as
/// `--serve`.
const DEV_ENV_VAR: &str = "WEAVER_DEV";

fn main() {
    let matches = App::new("weaver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static blog from a directory of Markdown posts")
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .takes_value(true)
                .value_name("FILE")
                .help("The project file (default: the nearest weaver.yaml)"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("DIR")
                .help("The output directory, overriding the project file"),
        )
        .arg(
            Arg::with_name("serve")
                .short("s")
                .long("serve")
                .help("Serve the output directory after building"),
        )
        .arg(
            Arg::with_name("port")
                .long("port")
                .takes_value(true)
                .help("The port to serve on, overriding the project file"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log every page written"),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"));

    if let Err(e) = run(&matches) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "weaver=debug" } else { "weaver=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(matches: &ArgMatches) -> Result<()> {
    let mut config = match matches.value_of("project") {
        Some(path) => Config::from_project_file(Path::new(path))?,
        None => Config::from_directory(&std::env::current_dir()?)?,
    };
    if let Some(output) = matches.value_of("output") {
        config.output_directory = PathBuf::from(output);
    }
    if let Some(port) = matches.value_of("port") {
        config.port = port.parse()?;
    }

    let summary = build(&config)?;
    info!(
        "built {} posts and {} tag pages into `{}`",
        summary.posts,
        summary.tags,
        config.output_directory.display()
    );

    if matches.is_present("serve") || std::env::var_os(DEV_ENV_VAR).is_some() {
        serve(&config.output_directory, &config.address, config.port)?;
    }
    Ok(())
}
