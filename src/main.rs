mod cli;
mod commands;
mod config;
mod mcp;
mod page_range;
mod pdf;
mod selection;
mod split;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::fmt::Display;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::pdf::crop::Margins;
use crate::pdf::metadata::MetadataUpdate;
use crate::pdf::page_numbers::PageNumberOptions;
use crate::pdf::watermark::WatermarkOptions;
use crate::pdf::Rgb;
use crate::split::SplitMethod;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    // Logs go to stderr; stdout carries command output and the MCP transport.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.log_filter)
                .with_context(|| format!("Invalid log filter: {}", config.log_filter))?,
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(config).await?;
        }
        Commands::Info { path, json } => {
            report(&commands::info::run(&path)?, json)?;
        }
        Commands::Resolve {
            path,
            total,
            pages,
            json,
        } => {
            let selection = pages.selection()?;
            let outcome = match (path, total) {
                (Some(path), _) => commands::resolve::run_for_file(&path, &selection)?,
                (None, Some(total)) => commands::resolve::run(total, &selection)?,
                (None, None) => anyhow::bail!("Give a PDF file or --total"),
            };
            report(&outcome, json)?;
        }
        Commands::Extract {
            path,
            pages,
            output,
        } => {
            let outcome = commands::extract::run(&config, &path, &pages.selection()?, &output)?;
            println!("{}", outcome);
        }
        Commands::Remove {
            path,
            pages,
            output,
        } => {
            let outcome = commands::remove::run(&config, &path, &pages.selection()?, &output)?;
            println!("{}", outcome);
        }
        Commands::Split {
            path,
            output_dir,
            ranges,
            at,
            chunk,
        } => {
            let method = match (ranges, at, chunk) {
                (Some(ranges), _, _) => {
                    SplitMethod::ByRanges(commands::split::parse_ranges(&ranges)?)
                }
                (None, Some(at), _) => SplitMethod::AtPages(commands::split::parse_points(&at)?),
                (None, None, Some(n)) => SplitMethod::EveryN(n),
                (None, None, None) => SplitMethod::AllPages,
            };
            println!(
                "{}",
                commands::split::run(&config, &path, &method, &output_dir)?
            );
        }
        Commands::Crop {
            path,
            pages,
            left,
            right,
            top,
            bottom,
            output,
        } => {
            let margins = Margins {
                left,
                right,
                top,
                bottom,
            };
            let outcome =
                commands::crop::run(&config, &path, &pages.selection()?, &margins, &output)?;
            println!("{}", outcome);
        }
        Commands::Number {
            path,
            pages,
            position,
            format,
            font_size,
            start,
            output,
        } => {
            let options = PageNumberOptions {
                position,
                format,
                font_size,
                start_number: start,
            };
            let outcome =
                commands::number::run(&config, &path, &pages.selection()?, &options, &output)?;
            println!("{}", outcome);
        }
        Commands::Watermark {
            path,
            pages,
            text,
            position,
            rotation,
            opacity,
            font_size,
            color,
            output,
        } => {
            let options = WatermarkOptions {
                text,
                position,
                rotation,
                opacity,
                font_size,
                color: Rgb::parse_hex(&color)?,
            };
            let outcome =
                commands::watermark::run(&config, &path, &pages.selection()?, &options, &output)?;
            println!("{}", outcome);
        }
        Commands::Metadata {
            path,
            title,
            author,
            subject,
            keywords,
            creator,
            producer,
            output,
        } => {
            let update = MetadataUpdate {
                title,
                author,
                subject,
                keywords,
                creator,
                producer,
            };
            if update.is_empty() {
                println!("{}", commands::info::run(&path)?);
            } else {
                let output = output.context("--output is required when changing metadata")?;
                println!(
                    "{}",
                    commands::metadata::run(&config, &path, &update, &output)?
                );
            }
        }
        Commands::Rotate {
            path,
            pages,
            degrees,
            output,
        } => {
            let outcome =
                commands::rotate::run(&config, &path, &pages.selection()?, degrees, &output)?;
            println!("{}", outcome);
        }
        Commands::ExtractImages {
            path,
            pages,
            output_dir,
        } => {
            let outcome = commands::images::run(&config, &path, &pages.selection()?, &output_dir)?;
            println!("{}", outcome);
        }
        Commands::Merge { inputs, output } => {
            println!("{}", commands::merge::run(&config, &inputs, &output)?);
        }
    }

    Ok(())
}

fn report<T: Serialize + Display>(outcome: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", outcome);
    }
    Ok(())
}
