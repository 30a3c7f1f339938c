use blackjack_rl::episode::SplitCredit;
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

pub mod persistence;

/// Placeholder for `~/.blackjack.yml`, resolved against the home directory.
pub const DEFAULT_CONFIG_PATH: &str = "~/.blackjack.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Cannot locate config file: {0}")]
    NotFound(String),

    #[error("Cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid rule or training setting: {0}")]
    InvalidRule(#[from] serde::de::value::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rule: ConfigRule,
    #[serde(default)]
    pub training: ConfigTraining,
    #[serde(default)]
    pub evaluation: ConfigEvaluation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRule {
    pub number_of_decks: u8,
    pub cut_card_proportion: f64,
    pub max_hands: u8,
    pub double_policy: String,
    pub dealer_hit_on_soft17: bool,
    pub allow_das: bool,
    pub allow_insurance: bool,
    #[serde(default)]
    pub stand_on_21: bool,

    pub payout_blackjack: f64,
    pub payout_insurance: f64,
}

impl TryInto<blackjack_rl::Rule> for ConfigRule {
    type Error = serde::de::value::Error;

    fn try_into(self) -> Result<blackjack_rl::Rule, Self::Error> {
        let blackjack_rule = blackjack_rl::Rule {
            number_of_decks: self.number_of_decks,
            cut_card_proportion: self.cut_card_proportion,
            max_hands: self.max_hands,
            double_policy: self.double_policy.parse()?,
            allow_das: self.allow_das,
            dealer_hit_on_soft17: self.dealer_hit_on_soft17,
            allow_insurance: self.allow_insurance,
            stand_on_21: self.stand_on_21,
            payout_blackjack: self.payout_blackjack,
            payout_insurance: self.payout_insurance,
        };

        Ok(blackjack_rule)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigTraining {
    /// One of `mc_exploring_starts`, `mc_epsilon_greedy`, `q_learning`,
    /// `double_q_learning`.
    pub method: String,
    pub episodes: u64,
    pub epsilon: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
    /// Step size of the Q-learning methods. Double Q-learning uses
    /// `1 / visits` when it is not set.
    pub alpha: Option<f64>,
    pub split_credit: String,
    pub bank: f64,
    pub bet: f64,
    pub seed: u64,
    pub output_dir: String,
    /// Policy file to start from, `basic` for basic strategy.
    pub init_policy: Option<String>,
}

impl Default for ConfigTraining {
    fn default() -> Self {
        ConfigTraining {
            method: String::from("mc_epsilon_greedy"),
            episodes: 1_000_000,
            epsilon: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.99999,
            alpha: Some(0.01),
            split_credit: String::from("Cascade"),
            bank: 1000.0,
            bet: 1.0,
            seed: 0,
            output_dir: String::from("."),
            init_policy: None,
        }
    }
}

impl ConfigTraining {
    pub fn split_credit(&self) -> Result<SplitCredit, serde::de::value::Error> {
        self.split_credit.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigEvaluation {
    pub rounds: u64,
    pub number_of_threads: usize,
    pub seed: u64,
}

impl Default for ConfigEvaluation {
    fn default() -> Self {
        ConfigEvaluation {
            rounds: 1_000_000,
            number_of_threads: 0,
            seed: 1,
        }
    }
}

/// Maps the default config path to the user's home directory and checks the
/// result is a file. Other paths are returned unchanged.
pub fn resolve_config_path(config: &str) -> Result<String, ConfigError> {
    if config != DEFAULT_CONFIG_PATH {
        return Ok(String::from(config));
    }

    let home_dir = home::home_dir()
        .ok_or_else(|| ConfigError::NotFound(String::from("no home directory")))?;
    let config_file_path = home_dir.join(".blackjack.yml");
    if !config_file_path.exists() {
        return Err(ConfigError::NotFound(format!(
            "{} not exists",
            config_file_path.display()
        )));
    }
    if config_file_path.is_dir() {
        return Err(ConfigError::NotFound(format!(
            "{} is a directory",
            config_file_path.display()
        )));
    }
    Ok(config_file_path.display().to_string())
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file(filename: &str) -> Result<Config, ConfigError> {
    let file_content = fs::read_to_string(filename).map_err(|source| ConfigError::Io {
        path: String::from(filename),
        source,
    })?;
    parse_config(&file_content)
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(content)?;
    config.training.split_credit()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_typical_config_rule() -> ConfigRule {
        ConfigRule {
            number_of_decks: 8,
            cut_card_proportion: 0.5,
            max_hands: 4,
            double_policy: String::from("AnyTwo"),
            dealer_hit_on_soft17: false,
            allow_das: false,
            allow_insurance: true,
            stand_on_21: false,
            payout_blackjack: 1.5,
            payout_insurance: 2.0,
        }
    }

    #[test]
    fn can_convert_rule() {
        let config_rule = get_typical_config_rule();
        let converted_rule: blackjack_rl::Rule = config_rule.try_into().unwrap();
        assert_eq!(converted_rule.number_of_decks, 8);
        assert_eq!(converted_rule.cut_card_proportion, 0.5);
        assert_eq!(
            converted_rule.double_policy,
            blackjack_rl::DoublePolicy::AnyTwo
        );
        assert!(!converted_rule.allow_das);
    }

    #[test]
    fn should_return_error_when_converting_rule() {
        let mut config_rule = get_typical_config_rule();
        config_rule.double_policy = String::from("Not a policy");
        let convert_result: Result<blackjack_rl::Rule, serde::de::value::Error> =
            config_rule.try_into();
        assert!(convert_result.is_err());
    }

    #[test]
    fn parse_full_config() {
        let content = "
rule:
  number_of_decks: 6
  cut_card_proportion: 0.8
  max_hands: 4
  double_policy: NineTenElevenOnly
  dealer_hit_on_soft17: true
  allow_das: true
  allow_insurance: false
  payout_blackjack: 1.5
  payout_insurance: 2.0
training:
  method: q_learning
  episodes: 5000
  alpha: 0.05
  split_credit: PerHand
evaluation:
  rounds: 100
  number_of_threads: 2
";
        let config = parse_config(content).unwrap();
        assert_eq!(config.training.method, "q_learning");
        assert_eq!(config.training.episodes, 5000);
        assert_eq!(config.training.alpha, Some(0.05));
        assert_eq!(config.training.split_credit().unwrap(), SplitCredit::PerHand);
        assert_eq!(config.training.bet, 1.0);
        assert_eq!(config.evaluation.rounds, 100);
        assert_eq!(config.evaluation.seed, 1);
        assert!(!config.rule.stand_on_21);

        let rule: blackjack_rl::Rule = config.rule.try_into().unwrap();
        assert!(rule.dealer_hit_on_soft17);
        assert_eq!(
            rule.double_policy,
            blackjack_rl::DoublePolicy::NineTenElevenOnly
        );
    }

    #[test]
    fn bad_split_credit_is_rejected() {
        let content = "
rule:
  number_of_decks: 6
  cut_card_proportion: 0.8
  max_hands: 4
  double_policy: AnyTwo
  dealer_hit_on_soft17: false
  allow_das: true
  allow_insurance: false
  payout_blackjack: 1.5
  payout_insurance: 2.0
training:
  split_credit: Sometimes
";
        assert!(matches!(
            parse_config(content),
            Err(ConfigError::InvalidRule(_))
        ));
    }

    #[test]
    fn explicit_config_path_is_kept() {
        assert_eq!(
            resolve_config_path("./blackjack.yml").unwrap(),
            "./blackjack.yml"
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            parse_config_from_file("/definitely/not/here.yml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
