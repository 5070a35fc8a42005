use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flight-delay", version, about = "Flight departure delay prediction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train a model from a historical CSV and write the artifact
    Train {
        #[arg(long, env = "DATA_PATH", default_value = "Flight Data.csv")]
        data: PathBuf,

        #[arg(long, env = "MODEL_PATH", default_value = "trained_model.json")]
        out: PathBuf,

        /// JSON training config; defaults are used when omitted
        #[arg(long, env = "TRAIN_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Score a single flight
    Predict {
        #[arg(long, env = "MODEL_PATH", default_value = "trained_model.json")]
        model: PathBuf,

        #[arg(long)]
        carrier: String,

        #[arg(long)]
        origin: String,

        #[arg(long)]
        destination: String,

        #[arg(long)]
        weather: String,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
        hour: u8,

        /// Travel date (YYYY-MM-DD); accepted but not used by the model
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve predictions over HTTP
    Serve {
        #[arg(long, env = "MODEL_PATH", default_value = "trained_model.json")]
        model: PathBuf,

        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },

    /// List the feature columns and known categories of a model
    Schema {
        #[arg(long, env = "MODEL_PATH", default_value = "trained_model.json")]
        model: PathBuf,
    },
}
