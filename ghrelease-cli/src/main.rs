use anyhow::{Error, Result};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use ghrelease::{
    fetch_download_totals, AssetKind, Document, Forge, ForgeBuilder, ForgeType, HtmlDocument,
    Release, ReleaseListRequest, ReleaseWidget, Repository, WidgetOptions,
};
use log::{debug, error};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc, str::FromStr};
use strum::VariantNames;
use thiserror::Error;

#[derive(Debug, Error)]
enum GhreleaseError {
    #[error("{0:}")]
    InvalidArgsError(String),
}

const DEFAULT_CONTAINER_ID: &str = "releases";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cmd = cmd();
    let matches = cmd.get_matches();
    let res = init_logger_from_matches(&matches);
    if let Err(e) = res {
        eprintln!("Error creating logger: {e}");
        std::process::exit(126);
    }

    let status = match make_forge(&matches) {
        Ok((forge, repository)) => match run(&matches, forge, repository).await {
            Ok(()) => 0,
            Err(e) => {
                print_err(&e);
                1
            }
        },
        Err(e) => {
            print_err(&e);
            127
        }
    };
    std::process::exit(status);
}

const MAX_TERM_WIDTH: usize = 100;

fn cmd() -> Command {
    Command::new("ghrelease")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Dave Rolsky <autarch@urth.org>")
        .about("Shows the releases of a project on GitHub or Forgejo")
        .arg(Arg::new("project").long("project").short('p').help(concat!(
            "The project whose releases you want to see, like houseabsolute/precious",
            " or https://github.com/houseabsolute/precious.",
        )))
        .arg(
            Arg::new("forge")
                .long("forge")
                .value_parser(clap::builder::PossibleValuesParser::new(
                    ForgeType::VARIANTS,
                ))
                .help(concat!(
                    "The forge to use. If this isn't set, then the value of --project will be",
                    " checked for codeberg.org. If this contains any other domain _or_ if it does",
                    " not have a domain at all, then the default is GitHub.",
                )),
        )
        .arg(Arg::new("api-base-url").long("api-base-url").help(concat!(
            "The the base URL for the forge site's API. This is useful for testing or if you want",
            " to operate against an Enterprise version of GitHub or a self-hosted Forgejo. This",
            " should be something like `https://github.my-corp.example.com/api/v3`.",
        )))
        .arg(
            Arg::new("container-id")
                .long("container-id")
                .default_value(DEFAULT_CONTAINER_ID)
                .help("The id of the element the latest release is rendered into."),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .short('l')
                .action(ArgAction::SetTrue)
                .help(concat!(
                    "Print every release with its publish date, followed by each of its assets",
                    " with their download counts and URLs, instead of rendering the latest",
                    " release.",
                )),
        )
        .arg(
            Arg::new("totals")
                .long("totals")
                .short('t')
                .action(ArgAction::SetTrue)
                .help(concat!(
                    "Print the download counts of every asset of every release, summed into",
                    " `exe` (names ending in `.exe`) and `jar` (everything else).",
                )),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output."),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debugging output."),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppresses most output."),
        )
        .group(ArgGroup::new("log-level").args(["verbose", "debug", "quiet"]))
        .max_term_width(MAX_TERM_WIDTH)
}

pub(crate) fn init_logger_from_matches(matches: &ArgMatches) -> Result<(), log::SetLoggerError> {
    let level = if matches.get_flag("debug") {
        log::LevelFilter::Debug
    } else if matches.get_flag("verbose") {
        log::LevelFilter::Info
    } else if matches.get_flag("quiet") {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    };

    ghrelease::init_logger(level)
}

fn make_forge(matches: &ArgMatches) -> Result<(Forge, Repository)> {
    validate_args(matches)?;

    let Some(project) = matches.get_one::<String>("project") else {
        return Err(
            GhreleaseError::InvalidArgsError("You must pass a --project.".to_string()).into(),
        );
    };
    let repository = Repository::from_str(project)?;

    let forge_type = match matches.get_one::<String>("forge") {
        Some(ft) => ForgeType::from_str(ft)?,
        None => ForgeType::detect(project),
    };
    let mut builder = ForgeBuilder::new().forge(forge_type);
    if let Some(url) = matches.get_one::<String>("api-base-url") {
        builder = builder.api_base_url(url);
    }

    Ok((builder.build()?, repository))
}

fn validate_args(matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("list") && matches.get_flag("totals") {
        return Err(GhreleaseError::InvalidArgsError(
            "You cannot combine the --list and --totals options".to_string(),
        )
        .into());
    }

    Ok(())
}

async fn run(matches: &ArgMatches, forge: Forge, repository: Repository) -> Result<()> {
    if matches.get_flag("list") {
        let releases = ReleaseListRequest::new(&forge, repository).fetch().await?;
        for line in list_lines(&releases) {
            println!("{line}");
        }
        return Ok(());
    }

    if matches.get_flag("totals") {
        let totals = fetch_download_totals(&forge, repository).await?;
        for line in totals_lines(&totals) {
            println!("{line}");
        }
        return Ok(());
    }

    let container_id = matches
        .get_one::<String>("container-id")
        .map_or(DEFAULT_CONTAINER_ID, String::as_str);
    let doc = Rc::new(RefCell::new(HtmlDocument::with_container(container_id)));
    let widget = ReleaseWidget::new(
        doc.clone(),
        forge,
        repository,
        container_id,
        WidgetOptions::default(),
    );
    let res = widget.load().await;
    debug!("Widget finished in the {:?} state", widget.state());

    // The container shows the error element when the load fails, so it's printed either way.
    let doc = doc.borrow();
    if let Some(container) = doc.element_by_id(container_id) {
        println!("{}", doc.to_html(container));
    }

    res?;

    Ok(())
}

fn list_lines(releases: &[Release]) -> Vec<String> {
    let mut lines = vec![];
    for release in releases {
        lines.push(format!("{} ({})", release.version, release.published_at));
        lines.extend(release.assets.iter().map(|asset| {
            format!(
                "    {} {} {}",
                asset.name, asset.download_count, asset.download_url,
            )
        }));
    }
    lines
}

fn totals_lines(totals: &BTreeMap<AssetKind, u64>) -> Vec<String> {
    totals
        .iter()
        .map(|(kind, total)| format!("{kind}: {total}"))
        .collect()
}

fn print_err(e: &Error) {
    error!("{e}");
    if let Some(ge) = e.downcast_ref::<GhreleaseError>() {
        match ge {
            GhreleaseError::InvalidArgsError(_) => {
                println!();
                if let Err(e) = cmd().print_help() {
                    error!("Could not print help: {e}");
                }
            }
        }
    }
}
