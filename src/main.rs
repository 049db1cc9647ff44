use std::io::{BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod catalog;
mod chat;
mod cli;
mod config;
mod recommend;
mod semantic;
mod similarity;
#[cfg(test)]
mod tests;
mod web;

use app::AppFactory;
use cli::Command;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();
    let config = AppFactory::create_config()?;

    match args.command {
        Command::Similar { title, count } => {
            let catalog = AppFactory::load_catalog(&config)?;
            let recommender = AppFactory::create_recommender(&config, catalog)?;

            let titles = recommender.similar_titles(&title, count);
            println!("{}", serde_json::to_string_pretty(&titles)?);
            Ok(())
        }

        Command::Personalize { seeds } => {
            let catalog = AppFactory::load_catalog(&config)?;
            let recommender = AppFactory::create_recommender(&config, catalog)?;

            let titles = recommender.personalize(&seeds);
            println!("{}", serde_json::to_string_pretty(&titles)?);
            Ok(())
        }

        Command::Suggest {} => {
            let catalog = AppFactory::load_catalog(&config)?;
            for title in catalog.suggestions() {
                println!("{title}");
            }
            Ok(())
        }

        Command::Chat { query } => {
            let catalog = AppFactory::load_catalog(&config)?;
            let chat = AppFactory::create_chat(&config, catalog)?;

            if let Some(query) = query {
                println!("{}", chat.retrieve_and_answer(&query));
                return Ok(());
            }

            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            loop {
                print!("You: ");
                stdout.flush()?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line.to_lowercase().as_str(), "exit" | "quit") {
                    break;
                }

                println!("Max: {}", chat.retrieve_and_answer(line));
            }
            Ok(())
        }

        Command::Daemon { listen } => {
            let engine = Arc::new(AppFactory::create_engine(&config)?);
            let listen = listen.unwrap_or_else(|| config.server.listen.clone());
            web::start_daemon(engine, listen)
        }
    }
}
