use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use calendar_events::{
    Categories, ConfigError, Exporter, Rules, UnknownCategory, DEFAULT_DOMAIN, DEFAULT_PRODID,
};
use getopts::Options;
use reqwest::Url;
use tokio::time::Duration;

use crate::store::Source;

const ADDRESS_ENV: &str = "CALENDAR_ADDR";
const EVENTS_ENV: &str = "CALENDAR_EVENTS";
const EVENTS_URL_ENV: &str = "CALENDAR_EVENTS_URL";

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub address: SocketAddr,
    pub source: Source,
    pub categories: Option<PathBuf>,
    pub domain: String,
    pub prodid: String,
    pub unknown_category: UnknownCategory,
    pub enable_cache: bool,
    pub cache_ttl: Duration,
    pub export_dir: Option<PathBuf>,
    pub prefix: String,
}

impl Args {
    pub fn rules(&self) -> Result<Rules, ConfigError> {
        let categories = match &self.categories {
            Some(path) => Categories::from_file(path)?,
            None => Categories::default(),
        };

        Ok(Rules::new(categories, self.unknown_category))
    }

    pub fn exporter(&self, rules: Rules) -> Exporter {
        Exporter::new(self.domain.as_str(), self.prodid.as_str(), rules)
    }
}

#[derive(Debug)]
pub enum Command {
    Help(String),
    Run(Args),
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080, env: CALENDAR_ADDR]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "e",
        "events",
        "JSON file with event records [Default: built-in events, env: CALENDAR_EVENTS]",
        "PATH",
    );
    opts.optopt(
        "u",
        "events-url",
        "HTTP(S) endpoint serving event records as JSON [env: CALENDAR_EVENTS_URL]",
        "URL",
    );
    opts.optopt(
        "C",
        "categories",
        "JSON file with the category list [Default: built-in categories]",
        "PATH",
    );
    opts.optopt(
        "d",
        "domain",
        "Domain used for event UIDs [Default: campus-calendar.example.com]",
        "DOMAIN",
    );
    opts.optopt("p", "prodid", "PRODID of generated calendars", "PRODID");
    opts.optopt(
        "",
        "unknown-category",
        "What to do with events of unknown category: uncategorized or reject \
         [Default: uncategorized]",
        "POLICY",
    );
    opts.optflag(
        "c",
        "enable-cache",
        "Enable caching of loaded events [Default: false]",
    );
    opts.optopt(
        "t",
        "cache-ttl",
        "Time-to-live for cached events [Default: 300]",
        "SECONDS",
    );
    opts.optopt(
        "o",
        "export-dir",
        "Write .ics files into this directory and exit instead of serving",
        "DIR",
    );
    opts.optopt(
        "",
        "prefix",
        "File name prefix for exported .ics files [Default: campus]",
        "PREFIX",
    );
    opts
}

pub fn try_parse<F>(args: Vec<String>, lookup: F) -> Result<Command, String>
where
    F: Fn(&str) -> Option<String>,
{
    let opts = opts();
    let matches = opts.parse(args.iter().skip(1)).map_err(|fail| fail.to_string())?;

    if matches.opt_present("help") {
        let program = args.first().map_or(env!("CARGO_PKG_NAME"), String::as_str);
        return Ok(Command::Help(opts.usage(&opts.short_usage(program))));
    }

    let address = match matches.opt_str("address").or_else(|| lookup(ADDRESS_ENV)) {
        Some(raw) => raw
            .parse()
            .map_err(|err| format!("Provided value for option 'address' is invalid: {err}"))?,
        None => SocketAddr::from(([127, 0, 0, 1], 8080)),
    };

    let file = matches.opt_str("events").or_else(|| lookup(EVENTS_ENV));
    let url = matches.opt_str("events-url").or_else(|| lookup(EVENTS_URL_ENV));

    let source = match (file, url) {
        (Some(_), Some(_)) => {
            return Err("Options 'events' and 'events-url' are mutually exclusive".into())
        }
        (Some(path), None) => Source::File(PathBuf::from(path)),
        (None, Some(raw)) => {
            let url = Url::parse(&raw).map_err(|err| {
                format!("Provided value for option 'events-url' is invalid: {err}")
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("Option 'events-url' must be http or https, got `{url}`"));
            }
            Source::Http(url)
        }
        (None, None) => Source::Builtin,
    };

    let unknown_category = match matches.opt_str("unknown-category") {
        Some(raw) => raw.parse().map_err(|err| {
            format!("Provided value for option 'unknown-category' is invalid: {err}")
        })?,
        None => UnknownCategory::default(),
    };

    let cache_ttl = matches
        .opt_get_default("cache-ttl", 300)
        .map(Duration::from_secs)
        .map_err(|err| format!("Provided value for option 'cache-ttl' is invalid: {err}"))?;

    let domain = matches
        .opt_str("domain")
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
    if domain.trim().is_empty() || domain.contains(char::is_whitespace) {
        return Err(format!("Provided value for option 'domain' is invalid: `{domain}`"));
    }

    Ok(Command::Run(Args {
        address,
        source,
        categories: matches.opt_str("categories").map(PathBuf::from),
        domain,
        prodid: matches
            .opt_str("prodid")
            .unwrap_or_else(|| DEFAULT_PRODID.to_string()),
        unknown_category,
        enable_cache: matches.opt_present("enable-cache"),
        cache_ttl,
        export_dir: matches.opt_str("export-dir").map(PathBuf::from),
        prefix: matches.opt_str("prefix").unwrap_or_else(|| "campus".to_string()),
    }))
}

pub fn parse(args: Vec<String>) -> Args {
    match try_parse(args, |key| env::var(key).ok()) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help(usage)) => {
            println!("{usage}");
            process::exit(0);
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
