use std::{collections::BTreeMap, time::Duration};

use serde_json::Value;

use crate::{statement::normalize_name, Error, Parameters, Result};

/// How a query may observe recent mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScanConsistency {
    /// Answer from whatever the indexes/replicas hold now. Results may be stale.
    #[default]
    NotBounded,
    /// Wait until every mutation issued before the request is visible.
    RequestPlus,
}

/// Per-query options.
///
/// Positional and named parameters are stored separately so that supplying
/// both is reported at execution time instead of one silently winning.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub scan_consistency: Option<ScanConsistency>,
    pub timeout: Option<Duration>,
    pub client_context_id: Option<String>,
    pub page_size: Option<i32>,
    positional: Option<Vec<Value>>,
    named: Option<BTreeMap<String, Value>>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `values` to `$1`, `$2`, ... in order.
    pub fn positional_parameters<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.positional = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Binds values by placeholder name. Keys may include the leading `$`.
    pub fn named_parameters<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let named = self.named.get_or_insert_with(BTreeMap::new);
        for (key, value) in values {
            named.insert(normalize_name(key.as_ref()).to_string(), value.into());
        }
        self
    }

    /// Adds a single named parameter.
    pub fn parameter(self, name: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.named_parameters([(name, value)])
    }

    pub fn scan_consistency(mut self, consistency: ScanConsistency) -> Self {
        self.scan_consistency = Some(consistency);
        self
    }

    /// Effective consistency, `NotBounded` unless set.
    pub fn consistency(&self) -> ScanConsistency {
        self.scan_consistency.unwrap_or_default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn client_context_id(mut self, id: impl Into<String>) -> Self {
        self.client_context_id = Some(id.into());
        self
    }

    /// Rows fetched per round trip while streaming. Must be at least 1.
    pub fn page_size(mut self, size: i32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Resolves the parameter set, rejecting positional and named together.
    pub fn parameters(&self) -> Result<Parameters> {
        match (&self.positional, &self.named) {
            (Some(_), Some(_)) => Err(Error::binding(
                "positional and named parameters cannot be combined in one query",
            )),
            (Some(values), None) => Ok(Parameters::Positional(values.clone())),
            (None, Some(values)) => Ok(Parameters::Named(values.clone())),
            (None, None) => Ok(Parameters::None),
        }
    }

    /// The page size, rejecting values below 1.
    pub fn checked_page_size(&self) -> Result<Option<i32>> {
        match self.page_size {
            Some(size) if size < 1 => Err(Error::InvalidOption(format!(
                "page size must be at least 1, got {size}"
            ))),
            size => Ok(size),
        }
    }

    /// Fills unset fields from `defaults`. Parameters are never inherited.
    pub(crate) fn or_defaults(mut self, defaults: &QueryOptions) -> Self {
        self.scan_consistency = self.scan_consistency.or(defaults.scan_consistency);
        self.timeout = self.timeout.or(defaults.timeout);
        self.page_size = self.page_size.or(defaults.page_size);
        self
    }
}

impl From<&QueryOptions> for QueryOptions {
    fn from(value: &QueryOptions) -> Self {
        value.clone()
    }
}

impl From<ScanConsistency> for QueryOptions {
    fn from(value: ScanConsistency) -> Self {
        QueryOptions::new().scan_consistency(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let opts = QueryOptions::new();

        assert_eq!(opts.consistency(), ScanConsistency::NotBounded);
        assert!(opts.timeout.is_none());
        assert_eq!(opts.parameters().unwrap(), Parameters::None);
    }

    #[test]
    fn test_explicit_consistency_wins() {
        let defaults = QueryOptions::new().scan_consistency(ScanConsistency::RequestPlus);
        let opts = QueryOptions::new()
            .scan_consistency(ScanConsistency::NotBounded)
            .or_defaults(&defaults);

        assert_eq!(opts.consistency(), ScanConsistency::NotBounded);
    }

    #[test]
    fn test_named_keys_normalized() {
        let opts = QueryOptions::new()
            .parameter("$type", "airline")
            .parameter("country", "United States");

        let Parameters::Named(map) = opts.parameters().unwrap() else {
            panic!("expected named parameters");
        };
        assert_eq!(map.get("type"), Some(&json!("airline")));
        assert_eq!(map.get("country"), Some(&json!("United States")));
    }

    #[test]
    fn test_both_kinds_rejected() {
        let opts = QueryOptions::new()
            .positional_parameters(["airline"])
            .parameter("country", "United States");

        assert!(matches!(opts.parameters(), Err(Error::ParameterBinding(_))));
    }

    #[test]
    fn test_checked_page_size() {
        assert_eq!(QueryOptions::new().checked_page_size().unwrap(), None);
        assert_eq!(QueryOptions::new().page_size(1).checked_page_size().unwrap(), Some(1));

        for size in [0, -1, i32::MIN] {
            assert!(matches!(
                QueryOptions::new().page_size(size).checked_page_size(),
                Err(Error::InvalidOption(_))
            ));
        }
    }

    #[test]
    fn test_or_defaults() {
        let defaults = QueryOptions::new()
            .scan_consistency(ScanConsistency::RequestPlus)
            .timeout(Duration::from_secs(5))
            .positional_parameters([1]);

        let opts = QueryOptions::new().page_size(50).or_defaults(&defaults);

        assert_eq!(opts.consistency(), ScanConsistency::RequestPlus);
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.page_size, Some(50));
        assert_eq!(opts.parameters().unwrap(), Parameters::None);
    }
}
