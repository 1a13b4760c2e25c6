use justconfig::error::ConfigError;
use justconfig::item::{MapAction, StringItem};

/// Split comma-separated configuration values into multiple items.
pub trait SplitList
where
    Self: Sized,
{
    fn split_list(self) -> Result<StringItem, ConfigError>;
}

impl SplitList for Result<StringItem, ConfigError> {
    /// Call this method to turn a single `a,b,c` configuration value into
    /// the value stack `a`, `b`, `c`. Surrounding whitespace of every part
    /// is removed. Values without a comma pass through unchanged.
    ///
    /// ## Example
    ///
    /// ```rust
    /// # use justconfig::Config;
    /// # use justconfig::ConfPath;
    /// # use justconfig::item::ValueExtractor;
    /// # use justconfig::sources::defaults::Defaults;
    /// # use minuet::config_processors::SplitList;
    /// #
    /// # let mut conf = Config::default();
    /// # let mut defaults = Defaults::default();
    /// defaults.set(conf.root().push_all(&["metrics"]), "Ndcg, Recall", "source info");
    /// conf.add_source(defaults);
    ///
    /// let values: Vec<String> = conf.get(ConfPath::from(&["metrics"])).split_list().values(1..).unwrap();
    ///
    /// assert_eq!(values, vec!["Ndcg", "Recall"]);
    /// ```
    fn split_list(self) -> Result<StringItem, ConfigError> {
        self?.map(|value| {
            if value.contains(',') {
                MapAction::Replace(
                    value
                        .split(',')
                        .map(|part| part.trim().to_owned())
                        .collect(),
                )
            } else {
                MapAction::Keep
            }
        })
    }
}
