// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::MAX_RECENCY_DAYS;
use clap::{Arg, ArgAction, Command, value_parser};

fn days_arg() -> Arg {
    Arg::new("days")
        .long("days")
        .value_parser(value_parser!(i64).range(0..=MAX_RECENCY_DAYS))
}

fn with_output(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn opt(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).help(help)
}

fn req(id: &'static str, help: &'static str) -> Arg {
    opt(id, help).required(true)
}

fn limit(default: &'static str) -> Arg {
    Arg::new("limit")
        .long("limit")
        .value_parser(value_parser!(usize))
        .default_value(default)
}

fn import_cmd() -> Command {
    Command::new("import")
        .about("Ingest uploaded data files")
        .subcommand_required(true)
        .subcommand(with_output(
            Command::new("file")
                .about("Normalize, validate and store a CSV/XLSX/JSON file")
                .arg(req("path", "File to read"))
                .arg(req(
                    "source",
                    "mergermarket|preqin|sec_filings|index_constituents|press_releases",
                ))
                .arg(opt("format", "csv|xlsx|json (defaults to the file extension)"))
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Validate only; store nothing"),
                )
                .arg(opt("out", "Write the processed rows to this CSV file")),
        ))
}

fn deal_cmd() -> Command {
    Command::new("deal")
        .about("Track M&A deals")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record a deal by hand")
                .arg(req("target", "Target company"))
                .arg(req("acquirer", "Acquiring company"))
                .arg(opt("value", "Deal value in USD millions"))
                .arg(opt("date", "Announcement date YYYY-MM-DD"))
                .arg(opt("industry", "Industry"))
                .arg(opt("sector", "Sector"))
                .arg(opt("geography", "Geography"))
                .arg(opt("type", "Deal type"))
                .arg(opt("status", "Rumored|Announced|Pending|Complete|Terminated"))
                .arg(opt("notes", "Free-form notes"))
                .arg(opt("deal-id", "Identifier; generated when omitted")),
        )
        .subcommand(with_output(
            Command::new("list").about("Newest deals first").arg(limit("50")),
        ))
        .subcommand(with_output(
            Command::new("search")
                .about("Search deals by name keywords and filters")
                .arg(opt("keywords", "Comma-separated; any may match target or acquirer"))
                .arg(opt("industries", "Comma-separated industries"))
                .arg(opt("min-value", "Minimum value in USD millions"))
                .arg(opt("max-value", "Maximum value in USD millions"))
                .arg(opt("from", "Announced on or after YYYY-MM-DD"))
                .arg(opt("to", "Announced on or before YYYY-MM-DD"))
                .arg(limit("100")),
        ))
        .subcommand(with_output(
            Command::new("recent")
                .about("Deals announced in the last N days")
                .arg(days_arg().default_value("7")),
        ))
        .subcommand(with_output(
            Command::new("history")
                .about("Deals where a company is target or acquirer")
                .arg(req("company", "Company name or fragment")),
        ))
        .subcommand(
            Command::new("rm")
                .about("Delete a deal")
                .arg(req("deal-id", "Deal identifier")),
        )
}

fn company_cmd() -> Command {
    Command::new("company")
        .about("Company universe")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record a company by hand")
                .arg(req("name", "Company name"))
                .arg(opt("ticker", "Ticker"))
                .arg(opt("industry", "Industry"))
                .arg(opt("sector", "Sector"))
                .arg(opt("geography", "Geography"))
                .arg(opt("market-cap", "Market cap in USD millions"))
                .arg(opt("revenue", "Revenue in USD millions"))
                .arg(opt("ebitda", "EBITDA in USD millions"))
                .arg(
                    Arg::new("employees")
                        .long("employees")
                        .value_parser(value_parser!(i64)),
                )
                .arg(opt("index", "Index membership")),
        )
        .subcommand(with_output(
            Command::new("list").about("Companies by market cap").arg(limit("50")),
        ))
        .subcommand(with_output(
            Command::new("screen")
                .about("Screen companies by industry, revenue and index")
                .arg(opt("industries", "Comma-separated industries"))
                .arg(opt("min-revenue", "Minimum revenue in USD millions"))
                .arg(opt("max-revenue", "Maximum revenue in USD millions"))
                .arg(opt("index", "Index membership contains"))
                .arg(
                    Arg::new("watchlist")
                        .long("watchlist")
                        .action(ArgAction::SetTrue)
                        .help("Only watchlisted companies"),
                ),
        ))
        .subcommand(
            Command::new("tag")
                .about("Add a tag to one or more companies")
                .arg(req("companies", "Comma-separated company names"))
                .arg(req("tag", "Tag to add")),
        )
}

fn alerts_cmd() -> Command {
    Command::new("alerts")
        .about("Keyword deal-sourcing alerts")
        .subcommand_required(true)
        .subcommand(
            Command::new("create")
                .about("Create an alert")
                .arg(req("name", "Alert name"))
                .arg(opt("keywords", "Comma-separated keywords"))
                .arg(opt("preset", "Comma-separated keyword categories (see `alerts presets`)"))
                .arg(opt("industries", "Comma-separated industries"))
                .arg(opt("geographies", "Comma-separated geographies"))
                .arg(opt("min-size", "Minimum deal size in USD millions"))
                .arg(opt("max-size", "Maximum deal size in USD millions"))
                .arg(opt("email", "Notification address"))
                .arg(
                    Arg::new("notify")
                        .long("notify")
                        .action(ArgAction::SetTrue)
                        .help("Send notifications on matches"),
                )
                .arg(opt("user", "Owner (defaults to the user_id setting)")),
        )
        .subcommand(with_output(
            Command::new("list")
                .about("Alerts of a user")
                .arg(opt("user", "Owner (defaults to the user_id setting)")),
        ))
        .subcommand(
            Command::new("rm")
                .about("Delete an alert")
                .arg(req("id", "Alert id").value_parser(value_parser!(i64))),
        )
        .subcommand(with_output(
            Command::new("test")
                .about("Evaluate one alert against recent deals")
                .arg(req("id", "Alert id").value_parser(value_parser!(i64)))
                .arg(days_arg().help("Recency window (defaults to alert_recency_days)")),
        ))
        .subcommand(with_output(
            Command::new("run")
                .about("Evaluate every alert and record triggers")
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Ignore the recency window"),
                ),
        ))
        .subcommand(
            Command::new("watch")
                .about("Run all alerts periodically")
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .value_parser(value_parser!(u64))
                        .help("Seconds between runs (defaults to watch_interval_secs)"),
                )
                .arg(
                    Arg::new("iterations")
                        .long("iterations")
                        .value_parser(value_parser!(u64))
                        .help("Stop after this many runs"),
                ),
        )
        .subcommand(with_output(
            Command::new("trending")
                .about("Deal keywords trending in recent deal names")
                .arg(days_arg().default_value("30")),
        ))
        .subcommand(with_output(
            Command::new("presets").about("Keyword categories for --preset"),
        ))
}

fn watchlist_cmd() -> Command {
    Command::new("watchlist")
        .about("Companies and deals to keep an eye on")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(req("type", "company|deal"))
                .arg(req("name", "Entity name"))
                .arg(opt("notes", "Notes"))
                .arg(opt("user", "Owner (defaults to the user_id setting)")),
        )
        .subcommand(with_output(
            Command::new("list").arg(opt("user", "Owner (defaults to the user_id setting)")),
        ))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Dashboard reports")
        .subcommand_required(true)
        .subcommand(with_output(
            Command::new("dashboard").about("Headline deal metrics"),
        ))
        .subcommand(with_output(
            Command::new("volume").about("Monthly deal count and value").arg(
                Arg::new("months")
                    .long("months")
                    .value_parser(value_parser!(usize))
                    .default_value("12"),
            ),
        ))
        .subcommand(with_output(
            Command::new("industries").about("Industries by deal count").arg(
                Arg::new("top")
                    .long("top")
                    .value_parser(value_parser!(usize))
                    .default_value("10"),
            ),
        ))
}

fn export_cmd() -> Command {
    Command::new("export")
        .about("Export data")
        .subcommand_required(true)
        .subcommand(
            Command::new("template")
                .about("Header-only CSV for a source")
                .arg(req("source", "Source name"))
                .arg(req("out", "Output file")),
        )
        .subcommand(
            Command::new("deals")
                .about("All deals as CSV or JSON")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["csv", "json"])
                        .default_value("csv"),
                )
                .arg(req("out", "Output file")),
        )
}

pub fn build_cli() -> Command {
    Command::new("dealflow")
        .about("M&A deal tracking, data ingestion and deal-sourcing alerts")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(import_cmd())
        .subcommand(deal_cmd())
        .subcommand(company_cmd())
        .subcommand(alerts_cmd())
        .subcommand(watchlist_cmd())
        .subcommand(with_output(
            Command::new("diligence")
                .about("Filings, red flags and deal history for a company")
                .arg(req("company", "Company name or fragment")),
        ))
        .subcommand(report_cmd())
        .subcommand(export_cmd())
        .subcommand(
            Command::new("sample")
                .about("Demonstration data")
                .subcommand_required(true)
                .subcommand(
                    Command::new("load")
                        .arg(
                            Arg::new("deals")
                                .long("deals")
                                .value_parser(value_parser!(usize))
                                .default_value("50"),
                        )
                        .arg(
                            Arg::new("companies")
                                .long("companies")
                                .value_parser(value_parser!(usize))
                                .default_value("100"),
                        ),
                ),
        )
        .subcommand(with_output(
            Command::new("doctor").about("Data status and quality checks"),
        ))
        .subcommand(
            Command::new("config")
                .about("Persistent settings")
                .subcommand_required(true)
                .subcommand(with_output(Command::new("list")))
                .subcommand(Command::new("get").arg(req("key", "Setting name")))
                .subcommand(
                    Command::new("set")
                        .arg(req("key", "Setting name"))
                        .arg(req("value", "New value")),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        build_cli().debug_assert();
    }
}
