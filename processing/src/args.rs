use std::{fs::File, io::BufReader, path::Path};

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{graph::TypeFilter, search::GroupBounds, Result};

pub const DEFAULT_TYPES: [&str; 7] = [
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "unclassified",
    "cycleway",
];

fn default_types() -> Vec<String> {
    DEFAULT_TYPES.iter().map(|t| t.to_string()).collect()
}

fn default_max_length() -> f64 {
    25000.0
}

fn default_min_length() -> f64 {
    2000.0
}

fn default_max_groups_per_start() -> usize {
    50
}

fn default_max_rounds() -> usize {
    100
}

/// Options of a batch search, from the command line or a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct GroupSearchOptions {
    /// Exclusive upper bound on a group's length, in metres
    #[clap(long, default_value_t = default_max_length())]
    #[serde(default = "default_max_length")]
    pub max_length: f64,
    /// Inclusive lower bound on a group's length, in metres
    #[clap(long, default_value_t = default_min_length())]
    #[serde(default = "default_min_length")]
    pub min_length: f64,
    /// Groups kept per start segment
    #[clap(short = 'g', long, default_value_t = default_max_groups_per_start())]
    #[serde(default = "default_max_groups_per_start")]
    pub max_groups_per_start: usize,
    /// Number of start segments searched
    #[clap(short = 'r', long, default_value_t = default_max_rounds())]
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    /// Road types taking part in the search
    #[clap(short, long = "type", value_delimiter = ',', default_values_t = default_types())]
    #[serde(default = "default_types")]
    pub types: Vec<String>,
    /// Let every road type take part, ignoring `--type`
    #[clap(long)]
    #[serde(default)]
    pub all_types: bool,
    /// Shuffle the start segments with this seed instead of taking them in order
    #[clap(long)]
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GroupSearchOptions {
    fn default() -> Self {
        GroupSearchOptions {
            max_length: default_max_length(),
            min_length: default_min_length(),
            max_groups_per_start: default_max_groups_per_start(),
            max_rounds: default_max_rounds(),
            types: default_types(),
            all_types: false,
            seed: None,
        }
    }
}

impl GroupSearchOptions {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn bounds(&self) -> Result<GroupBounds> {
        GroupBounds::new(self.max_length, self.min_length, self.max_groups_per_start)
    }

    /// An empty type list allows every type, like `all_types`.
    pub fn type_filter(&self) -> TypeFilter {
        if self.all_types {
            return TypeFilter::allow_all();
        }
        TypeFilter::new(self.types.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GroupSearchOptions::default();
        let bounds = opts.bounds().unwrap();
        assert_eq!(bounds.max_length, 25000.0);
        assert_eq!(bounds.min_length, 2000.0);
        assert_eq!(bounds.max_groups, 50);
        assert_eq!(opts.max_rounds, 100);

        let filter = opts.type_filter();
        assert!(filter.allows("cycleway"));
        assert!(!filter.allows("footway"));
    }

    #[test]
    fn test_partial_json() {
        let opts: GroupSearchOptions =
            serde_json::from_str(r#"{"max_length": 500, "types": [], "seed": 7}"#).unwrap();
        assert_eq!(opts.max_length, 500.0);
        assert_eq!(opts.min_length, 2000.0);
        assert_eq!(opts.seed, Some(7));
        assert!(opts.type_filter().allows("footway"));
        assert!(opts.bounds().is_err());
    }

    #[derive(Debug, clap::Parser)]
    struct TestCli {
        #[clap(flatten)]
        search: GroupSearchOptions,
    }

    #[test]
    fn test_all_types_flag() {
        use clap::Parser;

        let cli = TestCli::parse_from(["test"]);
        assert!(!cli.search.type_filter().allows("footway"));

        let cli = TestCli::parse_from(["test", "--all-types"]);
        assert!(cli.search.all_types);
        assert!(cli.search.type_filter().allows("footway"));

        let cli = TestCli::parse_from(["test", "--type", "footway,path"]);
        assert!(cli.search.type_filter().allows("path"));
        assert!(!cli.search.type_filter().allows("primary"));
    }
}
