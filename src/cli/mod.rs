// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands each subcommand to its
// use case in Layer 2. Printing happens here and nowhere else.
//
//   tag     — corpus → structured_data_dict.bin
//   train   — classifier + regressors → binary directory
//   predict — outcomes for a judgment file or facts vector
//   weights — first coefficient vector of each model

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TagArgs, TrainArgs, WeightsArgs};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(
    name = "precedent-predictor",
    version,
    about = "Tag judgments with regex features and predict their outcomes."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case of the chosen subcommand
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Tag(args)     => run_tag(args),
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Weights(args) => run_weights(args),
        }
    }
}

fn run_tag(args: TagArgs) -> Result<()> {
    use crate::application::tag_use_case::TagUseCase;

    let outcome = TagUseCase::new(args.into()).execute()?;
    let corpus  = &outcome.corpus;

    println!("Tagged {} judgments ({} skipped).", corpus.records.len(), corpus.skipped.len());
    for skipped in &corpus.skipped {
        println!("  skipped {}: {}", skipped.id, skipped.reason);
    }
    for (vector, labels) in &outcome.intent_index {
        println!("{vector}: {} slots", labels.len());
    }
    if let Some(path) = &corpus.blob_path {
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on judgments in: {}", args.corpus_dir);
    let summary = TrainUseCase::new(args.into()).execute()?;

    println!("Trained on {} judgments.", summary.documents);
    if let Some(report) = &summary.classifier {
        println!(
            "classifier: accuracy {:.4}, subset accuracy {:.4} ({} held out)",
            report.hamming_accuracy, report.subset_accuracy, report.test_size
        );
        for s in &report.labels {
            println!(
                "  {:<45} precision {:.3} recall {:.3} f1 {:.3} support {}",
                s.label, s.precision, s.recall, s.f1, s.support
            );
        }
    }
    for (name, report) in &summary.regressions {
        println!(
            "{name}: r2 {:.4}, explained variance {:.4} ({} held out)",
            report.r2, report.explained_variance, report.test_size
        );
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new((&args).into())?;

    let outcomes: Vec<(String, f64)> = match (&args.file, &args.facts) {
        (Some(file), _) => use_case.predict_file(Path::new(file))?.outcomes,
        (None, Some(facts)) => {
            let labels = use_case.labels();
            use_case
                .predict_facts(facts)?
                .into_iter()
                .enumerate()
                .map(|(i, v)| (labels.name(i).unwrap_or_default().to_string(), v))
                .collect()
        }
        (None, None) => anyhow::bail!("either --file or --facts is required"),
    };

    for (label, value) in outcomes {
        println!("{label:<45} {value}");
    }
    Ok(())
}

fn run_weights(args: WeightsArgs) -> Result<()> {
    use crate::application::predict_use_case::model_weights;

    for (name, weights) in model_weights(&args.binary_dir)? {
        match weights {
            Some(w) => println!("{name}: {w:?}"),
            None    => println!("{name}: not trained"),
        }
    }
    Ok(())
}
