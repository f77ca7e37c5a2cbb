use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("tagtally")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("tagtally")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress progress output and lower log verbosity").required(false))
        .arg(
            arg!(--"config" <PATH>)
                .required(false)
                .global(true)
                .help("JSON settings file; explicit flags override its values")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .subcommand_required(true)
        .subcommand(
            command!("fetch")
                .about("Fetch a batch of URLs and report the tag counts of each page")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("A URL to fetch (repeatable)")
                        .action(clap::ArgAction::Append)
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to fetch")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-c --"concurrency" <SLOTS>)
                        .required(false)
                        .help("Maximum number of fetches in flight")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help("Give up on unfinished URLs after this many seconds (0 waits forever)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown", "md"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("serve")
                .about("Serve batches over HTTP: POST a JSON array of URLs to /")
                .arg(
                    arg!(-b --"bind" <ADDR>)
                        .required(false)
                        .help("Address to listen on")
                        .value_parser(clap::value_parser!(std::net::SocketAddr))
                        .default_value("0.0.0.0:8989"),
                )
                .arg(
                    arg!(-c --"concurrency" <SLOTS>)
                        .required(false)
                        .help("Maximum number of fetches in flight across all requests")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help("Per-batch deadline in seconds (0 waits forever)")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_fetch_accepts_repeated_urls() {
        let matches = command_argument_builder()
            .try_get_matches_from([
                "tagtally", "fetch", "-u", "http://x/a", "-u", "http://x/b", "-c", "5",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "fetch");
        let urls: Vec<&String> = sub.get_many::<String>("url").unwrap().collect();
        assert_eq!(urls, ["http://x/a", "http://x/b"]);
        assert_eq!(sub.get_one::<usize>("concurrency"), Some(&5));
    }

    #[test]
    fn test_url_conflicts_with_hosts_file() {
        let result = command_argument_builder().try_get_matches_from([
            "tagtally", "fetch", "-u", "http://x/a", "-H", "hosts.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_defaults() {
        let matches = command_argument_builder()
            .try_get_matches_from(["tagtally", "serve"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(
            sub.get_one::<std::net::SocketAddr>("bind").unwrap().port(),
            8989
        );
    }
}
