use std::fmt;

/// Sentinel a filter control uses for "no filter".
pub const FILTER_ALL: &str = "all";

/// Query pairs ready for `RequestBuilder::query`.
pub type QueryPairs = Vec<(&'static str, String)>;

/// Keeps only the filter keys that actually constrain the query.
pub fn filter_pairs<'a, I>(pairs: I) -> QueryPairs
where
    I: IntoIterator<Item = (&'static str, Option<&'a str>)>,
{
    pairs
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value?.trim();
            if value.is_empty() || value == FILTER_ALL {
                None
            } else {
                Some((key, value.to_string()))
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InstanceFilters {
    pub status: Option<String>,
    pub mode: Option<String>,
    pub search: Option<String>,
}

impl InstanceFilters {
    pub fn to_query(&self) -> QueryPairs {
        filter_pairs([
            ("status", self.status.as_deref()),
            ("mode", self.mode.as_deref()),
            ("search", self.search.as_deref()),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HistoryFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub trigger_type: Option<String>,
    pub limit: Option<u32>,
}

impl HistoryFilters {
    pub fn to_query(&self) -> QueryPairs {
        let limit = self.limit.map(|limit| limit.to_string());
        filter_pairs([
            ("start_date", self.start_date.as_deref()),
            ("end_date", self.end_date.as_deref()),
            ("trigger_type", self.trigger_type.as_deref()),
            ("limit", limit.as_deref()),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SavingsRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl SavingsRange {
    pub fn as_str(self) -> &'static str {
        match self {
            SavingsRange::Week => "7d",
            SavingsRange::Month => "30d",
            SavingsRange::Quarter => "90d",
            SavingsRange::Year => "1y",
        }
    }

    pub fn to_query(self) -> QueryPairs {
        vec![("range", self.as_str().to_string())]
    }
}

impl fmt::Display for SavingsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_all_values_are_dropped() {
        let filters = InstanceFilters {
            status: Some("all".into()),
            mode: Some("spot".into()),
            search: Some("  ".into()),
        };
        assert_eq!(filters.to_query(), vec![("mode", "spot".to_string())]);

        let filters = InstanceFilters {
            status: Some("ALL".into()),
            ..Default::default()
        };
        assert_eq!(filters.to_query(), vec![("status", "ALL".to_string())]);
    }

    #[test]
    fn history_limit_is_serialized() {
        let filters = HistoryFilters {
            trigger_type: Some("manual".into()),
            limit: Some(50),
            ..Default::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("trigger_type", "manual".to_string()),
                ("limit", "50".to_string())
            ]
        );
    }
}
