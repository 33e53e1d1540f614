use colored::Colorize;
use commands::command_argument_builder;
use phishgraph::handlers::{
    handle_collect, handle_dataset, handle_dictionary, handle_encode, handle_graph,
};

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Logs go to stderr so `encode` and `graph` output stays pipeable
    if !quiet {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match chosen_command.subcommand() {
        Some(("dictionary", primary_command)) => handle_dictionary(primary_command, quiet),
        Some(("encode", primary_command)) => handle_encode(primary_command).await,
        Some(("collect", primary_command)) => handle_collect(primary_command, quiet).await,
        Some(("dataset", primary_command)) => handle_dataset(primary_command, quiet),
        Some(("graph", primary_command)) => handle_graph(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
