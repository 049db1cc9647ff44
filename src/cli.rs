use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Movies most similar to a title
    Similar {
        /// Movie title (case-insensitive)
        title: String,

        /// Number of similar movies
        #[clap(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Personalized picks from seed titles (most recent last)
    Personalize {
        /// Seed titles: recent interests, likes, saves
        seeds: Vec<String>,
    },

    /// Ask the movie assistant.
    /// Without a query reads questions from stdin until "exit".
    Chat {
        query: Option<String>,
    },

    /// Print every title for autocomplete
    Suggest {},

    /// Start the http api
    Daemon {
        /// Listen address, overrides config
        #[clap(long)]
        listen: Option<String>,
    },
}
