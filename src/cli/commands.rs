// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Four subcommands: `tag`, `train`, `predict`, `weights`.
// Each *Args struct converts into its application-layer config,
// so the application layer never sees clap types.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::predict_use_case::PredictConfig;
use crate::application::tag_use_case::TagConfig;
use crate::application::train_use_case::TrainConfig;
use crate::ml::RegressionStrategy;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag a corpus of judgments into structured_data_dict.bin
    Tag(TagArgs),

    /// Train the classifier and the magnitude regressors
    Train(TrainArgs),

    /// Predict the outcomes of a judgment or a facts vector
    Predict(PredictArgs),

    /// Print the first coefficient vector of every trained model
    Weights(WeightsArgs),
}

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Directory of plain-text judgments
    #[arg(long, default_value = "data/precedents")]
    pub corpus_dir: String,

    /// Where structured_data_dict.bin is written
    #[arg(long, default_value = "binary")]
    pub binary_dir: String,

    /// JSON pattern catalogue (built-in lease patterns if omitted)
    #[arg(long)]
    pub patterns: Option<String>,

    /// Process at most this many files
    #[arg(long)]
    pub limit: Option<usize>,
}

impl From<TagArgs> for TagConfig {
    fn from(a: TagArgs) -> Self {
        TagConfig {
            corpus_dir: a.corpus_dir,
            binary_dir: a.binary_dir,
            patterns:   a.patterns,
            limit:      a.limit,
        }
    }
}

/// How active outcome columns receive their amounts
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyArg {
    /// One regressor per registered outcome name
    PerDimension,
    /// One regressor over every outcome column
    MultiOutput,
}

impl From<StrategyArg> for RegressionStrategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::PerDimension => RegressionStrategy::PerDimension,
            StrategyArg::MultiOutput  => RegressionStrategy::MultiOutput,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[arg(long, default_value = "data/precedents")]
    pub corpus_dir: String,

    /// Where models, pipeline_config.json and metrics.csv go
    #[arg(long, default_value = "binary")]
    pub binary_dir: String,

    #[arg(long)]
    pub patterns: Option<String>,

    #[arg(long)]
    pub limit: Option<usize>,

    /// Tag the corpus again instead of reusing structured_data_dict.bin
    #[arg(long)]
    pub retag: bool,

    /// Full-batch passes over the training set
    #[arg(long, default_value_t = 500)]
    pub epochs: usize,

    /// Adam step size
    #[arg(long, default_value_t = 0.05)]
    pub lr: f64,

    /// Share of judgments held out for the quality report
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed of the train/test shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = StrategyArg::PerDimension)]
    pub strategy: StrategyArg,

    /// Amount used for tenant_ordered_to_pay_landlord_legal_fees
    #[arg(long, default_value_t = 80.0)]
    pub legal_fees: f64,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_dir:    a.corpus_dir,
            binary_dir:    a.binary_dir,
            patterns:      a.patterns,
            limit:         a.limit,
            retag:         a.retag,
            epochs:        a.epochs,
            learning_rate: a.lr,
            test_fraction: a.test_fraction,
            seed:          a.seed,
            strategy:      a.strategy.into(),
            legal_fees:    a.legal_fees,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Judgment text file to tag and resolve
    #[arg(long, conflicts_with = "facts", required_unless_present = "facts")]
    pub file: Option<String>,

    /// Comma-separated facts vector, e.g. "1,0,0,1,0,0,0,1,850"
    #[arg(long, value_delimiter = ',')]
    pub facts: Option<Vec<f64>>,

    #[arg(long, default_value = "binary")]
    pub binary_dir: String,
}

impl From<&PredictArgs> for PredictConfig {
    fn from(a: &PredictArgs) -> Self {
        PredictConfig { binary_dir: a.binary_dir.clone() }
    }
}

#[derive(Args, Debug)]
pub struct WeightsArgs {
    #[arg(long, default_value = "binary")]
    pub binary_dir: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config() {
        let cli = Cli::try_parse_from(["precedent-predictor", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg, TrainConfig::default());
    }

    #[test]
    fn test_strategy_flag() {
        let cli = Cli::try_parse_from(["precedent-predictor", "train", "--strategy", "multi-output"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(TrainConfig::from(args).strategy, RegressionStrategy::MultiOutput);
    }

    #[test]
    fn test_predict_needs_an_input() {
        assert!(Cli::try_parse_from(["precedent-predictor", "predict"]).is_err());
        let cli = Cli::try_parse_from(["precedent-predictor", "predict", "--facts", "1,0,850"]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        assert_eq!(args.facts, Some(vec![1.0, 0.0, 850.0]));
    }
}
