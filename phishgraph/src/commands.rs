use crate::CLAP_STYLING;
use clap::{arg, command};
use phishgraph::handlers::DEFAULT_DICTIONARY_PATH;
use std::path::PathBuf;

fn dictionary_arg() -> clap::Arg {
    arg!(-d --"dictionary" <PATH>)
        .required(false)
        .help("Dictionary produced by `phishgraph dictionary`")
        .default_value(DEFAULT_DICTIONARY_PATH)
}

fn config_arg() -> clap::Arg {
    arg!(-c --"config" <PATH>)
        .required(false)
        .help("JSON file with max_words, max_nodes and vocab_size")
        .value_parser(clap::value_parser!(PathBuf))
}

fn max_words_arg() -> clap::Arg {
    arg!(--"max-words" <N>)
        .required(false)
        .help("Length of the URL vector (overrides the config file)")
        .value_parser(clap::value_parser!(usize))
}

fn max_nodes_arg() -> clap::Arg {
    arg!(--"max-nodes" <N>)
        .required(false)
        .help("Node budget of the DOM graph matrices (overrides the config file)")
        .value_parser(clap::value_parser!(usize))
}

fn timeout_arg() -> clap::Arg {
    arg!(--"timeout" <SECONDS>)
        .required(false)
        .help("Request timeout in seconds")
        .value_parser(clap::value_parser!(u64))
        .default_value("20")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("phishgraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("phishgraph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress non-essential output").required(false))
        .subcommand_required(true)
        .subcommand(
            command!("dictionary")
                .about("Builds a URL token dictionary from a newline-delimited list of URLs")
                .arg(
                    arg!(-u --"urls-file" <PATH>)
                        .required(true)
                        .help("Path to a newline-delimited file of URLs")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to write the dictionary")
                        .default_value(DEFAULT_DICTIONARY_PATH),
                )
                .arg(
                    arg!(--"vocab-size" <N>)
                        .required(false)
                        .help("Vocabulary size, including the reserved unknown id 0")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10000"),
                ),
        )
        .subcommand(
            command!("encode")
                .about("Encodes one page into the model's URL vector, adjacency and feature matrices")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page URL"),
                )
                .arg(
                    arg!(--"html-file" <PATH>)
                        .required(false)
                        .help("Read the page HTML from a file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .conflicts_with("fetch"),
                )
                .arg(
                    arg!(--"fetch")
                        .required(false)
                        .help("Fetch the page HTML from the URL")
                        .action(clap::ArgAction::SetTrue)
                        .conflicts_with("html-file"),
                )
                .arg(dictionary_arg())
                .arg(config_arg())
                .arg(max_words_arg())
                .arg(max_nodes_arg())
                .arg(timeout_arg()),
        )
        .subcommand(
            command!("collect")
                .about("Fetches a list of URLs and stores the HTML pages as JSON lines")
                .arg(
                    arg!(-u --"urls-file" <PATH>)
                        .required(true)
                        .help("Path to a newline-delimited file of URLs")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(true)
                        .help("JSON lines file to append pages to")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of requests in flight at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("32"),
                )
                .arg(
                    arg!(-b --"batch-size" <N>)
                        .required(false)
                        .help("URLs per batch; each batch is written out once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1000"),
                )
                .arg(
                    arg!(-l --"limit" <N>)
                        .required(false)
                        .help("Stop after this many pages were fetched")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(timeout_arg()),
        )
        .subcommand(
            command!("dataset")
                .about("Encodes collected pages into feature records")
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("JSON lines of {url, html, label}")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(true)
                        .help("JSON lines file for the feature records")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(dictionary_arg())
                .arg(config_arg())
                .arg(max_words_arg())
                .arg(max_nodes_arg()),
        )
        .subcommand(
            command!("graph")
                .about("Prints the DOM graph of an HTML file in Graphviz DOT format")
                .arg(
                    arg!(--"html-file" <PATH>)
                        .required(true)
                        .help("The HTML file to read")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}
