use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use crossfeed_core::{
    AddUrl, CardProps, Entry, FetchConfig, FileCache, FormatOptions, HttpPageFetcher, PostCache, SiloProfile,
    UrlMode, card_to_json, fetch_file, fetch_stdin, format_entry_with_fetcher,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the formatted post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Format a feed entry into a post for a social silo
#[derive(Parser, Debug)]
#[command(name = "crossfeed")]
#[command(author = "Crossfeed Contributors")]
#[command(version)]
#[command(about = "Format feed entries into posts for social silos", long_about = None)]
struct Args {
    /// Entry HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<String>,

    /// Canonical URL of the entry (default: its u-url link)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Silo profile to start from (print, twitter, mastodon, bluesky, facebook)
    #[arg(short, long, default_value = "print", value_name = "SILO")]
    silo: SiloProfile,

    /// Maximum post length in characters, 0 for none (default: the silo's)
    #[arg(short, long, value_name = "NUM")]
    limit: Option<usize>,

    /// When to append the entry URL (auto, always, never)
    #[arg(long, value_name = "POLICY")]
    add_url: Option<AddUrl>,

    /// Where link URLs go (inline, last, bottom-list, erase)
    #[arg(long, value_name = "MODE")]
    url_mode: Option<UrlMode>,

    /// Meta attribute naming card tags, e.g. "property"
    #[arg(long, value_name = "ATTR", requires = "card_namespace")]
    card_attr: Option<String>,

    /// Namespace of card tags, e.g. "og"
    #[arg(long, value_name = "NS", requires = "card_attr")]
    card_namespace: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTTP timeout in seconds for card pages
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// JSON file remembering which entries were posted to which silo
    #[arg(long, value_name = "FILE")]
    cache: Option<PathBuf>,

    /// Record the entry as posted to the silo in the cache
    #[arg(long, requires = "cache")]
    mark_posted: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<clap_complete::Shell>,
}

impl Args {
    /// The silo's defaults, overridden by explicit flags.
    fn format_options(&self) -> FormatOptions {
        let mut options = self.silo.options();
        if let Some(limit) = self.limit {
            options.limit = Some(limit);
        }
        if let Some(add_url) = self.add_url {
            options.add_url = add_url;
        }
        if let Some(url_mode) = self.url_mode {
            options.url_mode = Some(url_mode);
        }
        if let (Some(attr), Some(namespace)) = (&self.card_attr, &self.card_namespace) {
            options.card_props = Some(CardProps::new(attr, namespace));
        }
        options
    }

    fn fetch_config(&self) -> FetchConfig {
        let default = FetchConfig::default();
        FetchConfig { timeout: self.timeout, user_agent: self.user_agent.clone().unwrap_or(default.user_agent) }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn run(args: Args) -> anyhow::Result<()> {
    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "crossfeed", &mut io::stdout());
        return Ok(());
    }

    let input = args.input.as_deref().context("No input given")?;

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
        echo::print_step(1, 3, if input == "-" { "Reading from stdin" } else { "Reading entry file" });
    }

    let html = if input == "-" {
        fetch_stdin().context("Failed to read from stdin")?
    } else {
        fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?
    };

    let entry = Entry::from_html(args.url.as_deref(), &html);

    let mut cache = args.cache.as_deref().map(FileCache::load).transpose().context("Failed to load post cache")?;
    if let Some(cache) = &cache {
        match entry.url() {
            Some(url) if cache.was_posted(args.silo.name(), url) => {
                echo::print_warning(&format!("Entry {} was already posted to {}, skipping", url, args.silo));
                return Ok(());
            }
            Some(_) => {}
            None => echo::print_warning("Entry has no URL, the post cache can't track it"),
        }
    }

    if args.verbose {
        echo::print_detail("Size", &echo::format_size(html.len()));
        echo::print_detail("URL", entry.url().unwrap_or("none"));
        echo::print_detail("Kind", if entry.is_micropost() { "micropost" } else { "article" });
        eprintln!();
        echo::print_step(2, 3, &format!("Formatting for {}", args.silo.bright_white()));
    }

    let options = args.format_options();
    tracing::debug!("Format options: {:?}", options);

    let mut flattener = args.silo.flattener();
    let fetcher = HttpPageFetcher::new(args.fetch_config());
    let card = format_entry_with_fetcher(&entry, &options, flattener.as_mut(), &fetcher)
        .context("Failed to format entry")?;

    if args.verbose {
        echo::print_card_details(&card, options.limit);
        echo::print_step(3, 3, "Writing output");
    }

    let output = match args.format {
        OutputFormat::Text => {
            if !card.url_spans.is_empty() {
                echo::print_warning("Link spans are only included in JSON output");
            }
            format!("{}\n", card.text)
        }
        OutputFormat::Json => format!("{}\n", card_to_json(&card, true).context("Failed to serialize card")?),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            print!("{}", output);
        }
    }

    if args.mark_posted
        && let Some(cache) = cache.as_mut()
        && let Some(url) = entry.url()
    {
        cache.add_post(args.silo.name(), url).context("Failed to update post cache")?;
        echo::print_success(&format!("Recorded as posted to {} in {}", args.silo, cache.path().display()));
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            echo::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
