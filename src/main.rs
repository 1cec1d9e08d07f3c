use std::path::PathBuf;
use std::str::FromStr;

use crate::config::Config;
use crate::logging::{init_logging, LoggingConfig};
use crate::tui::{Component, Tab};

use clap::{arg, ArgMatches, Command};
use eyre::WrapErr;

mod aggregate;
mod config;
mod entry;
mod error;
mod format;
mod logging;
mod report;
mod session;
mod tui;

fn cli() -> Command {
    Command::new("portfolio_tracker")
        .about("Record investment entries and chart their performance")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("config")
                .about("Print the path to the config file and the components it can disable"),
        )
        .subcommand(
            Command::new("tui")
                .about("Open the interactive entry form, table and charts")
                .arg(arg!(--tab <TAB> "Tab to open: entry, entries or charts").required(false)),
        )
        .subcommand(
            Command::new("report")
                .about("Compute entries from a JSON file of form submissions and print them")
                .arg(arg!(<FILE> "JSON array of form submissions"))
                .arg(arg!(--json "Print the entries and aggregates as JSON")),
        )
}

fn print_config_info() -> eyre::Result<()> {
    println!(
        "Your config file is located here: \n{}",
        Config::path()?.display()
    );
    println!("\nComponents that can be listed under disabled_components:");
    for component in Component::all() {
        println!("  {:<18} {}", component.as_str(), component.description());
    }
    Ok(())
}

/// Runs the chosen subcommand. The config is loaded only by the commands
/// that use it, so `config` still works when the file is malformed.
async fn run(
    matches: ArgMatches,
    load_config: impl FnOnce() -> eyre::Result<Config>,
) -> eyre::Result<()> {
    match matches.subcommand() {
        Some(("config", _)) => print_config_info(),
        Some(("tui", sub)) => {
            let cfg = load_config()?;
            init_logging(&LoggingConfig::for_tui(
                &cfg.log_level,
                cfg.log_file.clone(),
            ))?;
            let tab_name = sub
                .get_one::<String>("tab")
                .map(String::as_str)
                .unwrap_or(&cfg.default_tab);
            let tab = Tab::from_str(tab_name).map_err(|e| eyre::eyre!(e))?;
            tui::run_tui(tab, cfg.disabled_components).await
        }
        Some(("report", sub)) => {
            let cfg = load_config()?;
            init_logging(&LoggingConfig::for_cli(&cfg.log_level))?;
            let file = sub
                .get_one::<String>("FILE")
                .map(PathBuf::from)
                .ok_or_else(|| eyre::eyre!("missing FILE argument"))?;
            let today = chrono::Local::now().date_naive();
            report::run_report(&file, sub.get_flag("json"), today)
                .wrap_err("report failed")
        }
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    run(cli().get_matches(), Config::load).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli() {
        let matches =
            cli().get_matches_from(vec!["portfolio_tracker", "report", "entries.json", "--json"]);
        assert_eq!(matches.subcommand_name(), Some("report"));
        let sub = matches.subcommand_matches("report").unwrap();
        assert_eq!(
            sub.get_one::<String>("FILE").map(String::as_str),
            Some("entries.json")
        );
        assert!(sub.get_flag("json"));
    }

    #[test]
    fn test_cli_tab_is_optional() {
        let matches = cli().get_matches_from(vec!["portfolio_tracker", "tui"]);
        let sub = matches.subcommand_matches("tui").unwrap();
        assert_eq!(sub.get_one::<String>("tab"), None);

        let matches = cli().get_matches_from(vec!["portfolio_tracker", "tui", "--tab", "charts"]);
        let sub = matches.subcommand_matches("tui").unwrap();
        assert_eq!(
            sub.get_one::<String>("tab").map(String::as_str),
            Some("charts")
        );
    }

    fn broken_config() -> eyre::Result<Config> {
        Err(eyre::eyre!("invalid config file"))
    }

    #[tokio::test]
    async fn test_config_command_skips_config_load() {
        let matches = cli().get_matches_from(vec!["portfolio_tracker", "config"]);
        let mut loaded = false;
        let result = run(matches, || {
            loaded = true;
            broken_config()
        })
        .await;
        assert!(!loaded);
        // only the path lookup can fail here, never the config parse
        if let Err(e) = result {
            assert!(!e.to_string().contains("invalid config file"));
        }
    }

    #[tokio::test]
    async fn test_report_command_surfaces_config_errors() {
        let matches = cli().get_matches_from(vec!["portfolio_tracker", "report", "entries.json"]);
        let err = run(matches, broken_config).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid config file");
    }

    #[test]
    fn test_cli_verifies() {
        cli().debug_assert();
    }
}
