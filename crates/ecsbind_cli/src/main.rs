use clap::Parser;
use ecsbind_utils::{ok, AnyResult};
use log::LevelFilter;

fn main() -> AnyResult {
    pretty_env_logger::formatted_builder()
        .format_indent(None)
        .format_timestamp(None)
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let cli = ecsbind_cli::Cli::parse_from(wild::args());
    ecsbind_cli::run(cli)?;
    ok()
}
