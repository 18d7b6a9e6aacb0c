use clap::{Parser, ValueEnum};
use profile_harvest::Source;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "profile-harvest")]
#[command(about = "Harvests structured profile records through a WebDriver session")]
#[command(version)]
pub struct Args {
    /// Profile URLs to harvest (profiles mode)
    pub targets: Vec<String>,

    /// Where the profile URLs come from
    #[arg(short, long, value_enum, default_value_t = ModeArg::Profiles)]
    pub mode: ModeArg,

    /// Search keyword (search mode)
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Number of search result pages to walk (search mode)
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Maximum number of connections to collect (connections mode)
    #[arg(long)]
    pub max: Option<usize>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the harvested records are written to
    #[arg(short, long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Only print the discovered profile URLs, skip harvesting
    #[arg(long)]
    pub links_only: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Profiles,
    Search,
    Connections,
}

/// Convert from CLI arguments to the internal source type
pub fn convert_source(args: &Args) -> Result<Source, String> {
    match args.mode {
        ModeArg::Profiles => {
            if args.targets.is_empty() {
                return Err("profiles mode requires at least one profile URL".to_string());
            }
            Ok(Source::Profiles(args.targets.clone()))
        }
        ModeArg::Search => match &args.keyword {
            Some(keyword) => Ok(Source::Search {
                keyword: keyword.clone(),
                pages: args.pages,
            }),
            None => Err("search mode requires --keyword".to_string()),
        },
        ModeArg::Connections => Ok(Source::Connections { max: args.max }),
    }
}
