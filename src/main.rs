use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use flight_delay::{dataset, server, state, CategoricalField, FlightQuery, TrainConfig, Trainer};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Train { data, out, config } => {
            let cfg = match config {
                Some(p) => TrainConfig::load(&p)
                    .with_context(|| format!("failed to load training config {}", p.display()))?,
                None => TrainConfig::default(),
            };
            let records = dataset::load_csv(&data)
                .with_context(|| format!("failed to load dataset {}", data.display()))?;
            let report = Trainer::new(cfg)?
                .train_to_file(&records, &out)
                .context("training failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("Model has been trained and saved to '{}'", out.display());
        }

        Command::Predict {
            model,
            carrier,
            origin,
            destination,
            weather,
            hour,
            date,
            json,
        } => {
            let predictor = state::init(&model)
                .with_context(|| format!("failed to load model {}", model.display()))?;
            let query = FlightQuery {
                travel_date: date,
                ..FlightQuery::new(carrier, origin, destination, weather, hour)
            };
            let result = predictor.predict(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Prediction: {}", result.label);
                println!("Probability of Delay: {:.2}%", result.delay_probability * 100.0);
                println!("Risk tier: {}", result.tier);
            }
        }

        Command::Serve { model, port } => {
            // refuse to listen without a usable model
            let predictor = state::init(&model)
                .with_context(|| format!("failed to load model {}", model.display()))?;
            server::serve(predictor, port).await?;
        }

        Command::Schema { model } => {
            let predictor = state::init(&model)
                .with_context(|| format!("failed to load model {}", model.display()))?;
            let schema = predictor.schema();
            println!("{} feature columns", schema.len());
            for field in CategoricalField::ALL {
                println!("{}: {}", field, schema.categories(field).join(", "));
            }
        }
    }
    Ok(())
}
