use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("crossfeed")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Crossfeed Contributors")
        .about("Format feed entries into posts for social silos")
        .arg(clap::arg!([INPUT] "Entry HTML file, or '-' for stdin"))
        .arg(clap::arg!(--url <URL> "Canonical URL of the entry (default: its u-url link)"))
        .arg(
            clap::arg!(-s --silo <SILO> "Silo profile to start from")
                .default_value("print")
                .value_parser(["print", "twitter", "mastodon", "bluesky", "facebook"]),
        )
        .arg(clap::arg!(-l --limit <NUM> "Maximum post length in characters, 0 for none"))
        .arg(
            clap::arg!(--"add-url" <POLICY> "When to append the entry URL")
                .value_name("POLICY")
                .value_parser(["auto", "always", "never"]),
        )
        .arg(
            clap::arg!(--"url-mode" <MODE> "Where link URLs go")
                .value_name("MODE")
                .value_parser(["inline", "last", "bottom-list", "erase"]),
        )
        .arg(clap::arg!(--"card-attr" <ATTR> "Meta attribute naming card tags, e.g. 'property'").value_name("ATTR"))
        .arg(clap::arg!(--"card-namespace" <NS> "Namespace of card tags, e.g. 'og'").value_name("NS"))
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (text, json)")
                .value_name("FORMAT")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds for card pages").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(
            clap::arg!(--cache <FILE> "JSON file remembering which entries were posted to which silo")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"mark-posted" "Record the entry as posted to the silo in the cache").requires("cache"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_name("SHELL")
                .value_parser(["bash", "zsh", "fish", "powershell"]),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "crossfeed", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "crossfeed", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "crossfeed", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "crossfeed", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
