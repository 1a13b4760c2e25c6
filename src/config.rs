use std::ffi::OsStr;
use std::fs::File;

use justconfig::item::ValueExtractor;
use justconfig::processors::Trim;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::config_processors::SplitList;
use crate::io::{DEFAULT_ITEM_COL, DEFAULT_USER_COL};
use crate::metrics::MetricKind;

// Set some default values
const DEFAULT_TOP_K: usize = 10;
const DEFAULT_LOG_LEVEL: &str = "info";

pub struct AppConfig {
    pub log: LogConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
    pub eval: EvalConfig,
    pub report: ReportConfig,
}

pub struct LogConfig {
    pub level: String,
}

pub struct DataConfig {
    pub training_data_path: String,
    pub test_data_path: String,
    pub user_col: String,
    pub item_col: String,
}

pub struct ModelConfig {
    pub model_path: String,
    pub quantized_model_path: String,
    pub quantize: bool,
}

/// Evaluation settings threaded explicitly through every call; the cutoff
/// is shared by all metrics within one evaluation.
#[derive(Clone, Debug)]
pub struct EvalConfig {
    pub top_k: usize,
    pub metrics: Vec<MetricKind>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            top_k: DEFAULT_TOP_K,
            metrics: vec![MetricKind::Ndcg, MetricKind::Recall],
        }
    }
}

impl EvalConfig {
    /// The historical configuration with all four metrics enabled.
    pub fn legacy() -> EvalConfig {
        EvalConfig {
            top_k: DEFAULT_TOP_K,
            metrics: MetricKind::ALL.to_vec(),
        }
    }
}

pub struct ReportConfig {
    pub save_records: bool,
    pub out_path: String,
}

impl AppConfig {
    pub fn new(config_path: String) -> AppConfig {
        // Initialize config object
        let mut conf = Config::default();

        // Check if there is a config file
        if let Ok(config_file) = File::open(&config_path) {
            let config_text = ConfigText::new(config_file, &config_path)
                .expect("Loading configuration file failed.");
            conf.add_source(config_text);
        }

        // Define config params from environment variables
        let config_env = Env::new(&[
            (
                ConfPath::from(&["data", "training_data_path"]),
                OsStr::new("TRAINING_DATA"),
            ),
            (
                ConfPath::from(&["data", "test_data_path"]),
                OsStr::new("TEST_DATA"),
            ),
            (
                ConfPath::from(&["model", "model_path"]),
                OsStr::new("MODEL_PATH"),
            ),
        ]);
        conf.add_source(config_env);

        // Parse into custom config struct
        AppConfig::parse(conf)
    }

    fn parse(conf: justconfig::Config) -> AppConfig {
        AppConfig {
            log: LogConfig::parse(&conf, ConfPath::from(&["log"])),
            data: DataConfig::parse(&conf, ConfPath::from(&["data"])),
            model: ModelConfig::parse(&conf, ConfPath::from(&["model"])),
            eval: EvalConfig::parse(&conf, ConfPath::from(&["eval"])),
            report: ReportConfig::parse(&conf, ConfPath::from(&["eval"])),
        }
    }
}

impl LogConfig {
    fn parse(conf: &Config, path: ConfPath) -> LogConfig {
        LogConfig {
            level: conf
                .get(path.push("level"))
                .trim()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_LOG_LEVEL)),
        }
    }
}

impl DataConfig {
    fn parse(conf: &Config, path: ConfPath) -> DataConfig {
        DataConfig {
            training_data_path: conf
                .get(path.push("training_data_path"))
                .trim()
                .value()
                .unwrap_or_default(),
            test_data_path: conf
                .get(path.push("test_data_path"))
                .trim()
                .value()
                .unwrap_or_default(),
            user_col: conf
                .get(path.push("user_col"))
                .trim()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_USER_COL)),
            item_col: conf
                .get(path.push("item_col"))
                .trim()
                .value()
                .unwrap_or_else(|_| String::from(DEFAULT_ITEM_COL)),
        }
    }
}

impl ModelConfig {
    fn parse(conf: &Config, path: ConfPath) -> ModelConfig {
        ModelConfig {
            model_path: conf
                .get(path.push("model_path"))
                .trim()
                .value()
                .unwrap_or_default(),
            quantized_model_path: conf
                .get(path.push("quantized_model_path"))
                .trim()
                .value()
                .unwrap_or_default(),
            quantize: conf
                .get(path.push("quantize"))
                .trim()
                .value()
                .unwrap_or(false),
        }
    }
}

impl EvalConfig {
    fn parse(conf: &Config, path: ConfPath) -> EvalConfig {
        let default = EvalConfig::default();
        let metric_names: Vec<String> = conf
            .get(path.push("metrics"))
            .trim()
            .split_list()
            .values(1..)
            .unwrap_or_default();
        let metrics = if metric_names.is_empty() {
            default.metrics
        } else {
            metric_names
                .iter()
                .map(|name| {
                    MetricKind::from_name(name)
                        .unwrap_or_else(|| panic!("Unknown metric name: {}", name))
                })
                .collect()
        };
        EvalConfig {
            top_k: conf
                .get(path.push("top_k"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_TOP_K),
            metrics,
        }
    }
}

impl ReportConfig {
    fn parse(conf: &Config, path: ConfPath) -> ReportConfig {
        ReportConfig {
            save_records: conf
                .get(path.push("save_records"))
                .trim()
                .value()
                .unwrap_or(false),
            out_path: conf
                .get(path.push("out_path"))
                .trim()
                .value()
                .unwrap_or_default(),
        }
    }
}
