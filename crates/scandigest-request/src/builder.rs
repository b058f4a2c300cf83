//! Aggregation builder: request parameters to aggregations.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use scandigest_core::{Aggregation, ConfigError, BY_NAME_GRANULARITY};

use crate::error::{RequestError, Result};
use crate::params::RequestParameters;

/// The declared type of an attribute, decided by the caller's endpoint schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Date,
    DateTime,
    Integer,
    String,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeType::Date => "date",
            AttributeType::DateTime => "datetime",
            AttributeType::Integer => "int",
            AttributeType::String => "string",
        })
    }
}

impl FromStr for AttributeType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date" => Ok(AttributeType::Date),
            "datetime" => Ok(AttributeType::DateTime),
            "int" | "integer" => Ok(AttributeType::Integer),
            "string" => Ok(AttributeType::String),
            other => Err(RequestError::UnknownAttributeType(other.to_string())),
        }
    }
}

/// Accumulates at most one aggregation per attribute from request parameters.
///
/// Aggregations are kept in the order their attributes were added.
pub struct AggregationBuilder<'a, P: RequestParameters + ?Sized> {
    params: &'a P,
    result: Vec<Aggregation>,
}

impl<'a, P: RequestParameters + ?Sized> AggregationBuilder<'a, P> {
    pub fn new(params: &'a P) -> Self {
        Self {
            params,
            result: Vec::new(),
        }
    }

    /// Add whichever aggregation the parameters request for `attr`.
    ///
    /// `by-name` granularity wins, then prefix offsets, then a date or integer
    /// granularity according to `attr_type`. Returns whether one was added.
    /// An attribute that already has an aggregation is skipped.
    pub fn maybe_add(&mut self, attr: &str, attr_type: AttributeType) -> Result<bool> {
        if self.has_aggregation(attr) {
            return Ok(false);
        }
        if self.maybe_add_by_name_aggregation(attr) {
            return Ok(true);
        }
        if self.maybe_add_string_prefix_aggregation(attr)? {
            return Ok(true);
        }
        match attr_type {
            AttributeType::Date | AttributeType::DateTime => self.maybe_add_date_aggregation(attr),
            AttributeType::Integer => self.maybe_add_integer_aggregation(attr),
            AttributeType::String => match self.quantizing_granularity(attr) {
                Some(g) => Err(RequestError::Config {
                    attribute: attr.to_string(),
                    source: ConfigError::InvalidGranularity(g.to_string()),
                }),
                None => Ok(false),
            },
        }
    }

    /// Add a date aggregation if `<attr>-granularity` names a date granularity.
    pub fn maybe_add_date_aggregation(&mut self, attr: &str) -> Result<bool> {
        if self.has_aggregation(attr) {
            return Ok(false);
        }
        let Some(granularity) = self.quantizing_granularity(attr) else {
            return Ok(false);
        };
        let granularity = granularity.parse().map_err(|e| config_error(attr, e))?;
        let parent = self.parent(attr);
        self.push(Aggregation::date(attr, granularity, parent));
        Ok(true)
    }

    /// Add an integer aggregation if `<attr>-granularity` names an integer granularity.
    pub fn maybe_add_integer_aggregation(&mut self, attr: &str) -> Result<bool> {
        if self.has_aggregation(attr) {
            return Ok(false);
        }
        let Some(granularity) = self.quantizing_granularity(attr) else {
            return Ok(false);
        };
        let granularity = granularity.parse().map_err(|e| config_error(attr, e))?;
        let parent = self.parent(attr);
        self.push(Aggregation::integer(attr, granularity, parent));
        Ok(true)
    }

    /// Add a by-name aggregation if `<attr>-granularity` is `by-name`.
    pub fn maybe_add_by_name_aggregation(&mut self, attr: &str) -> bool {
        if self.has_aggregation(attr) || self.granularity(attr) != Some(BY_NAME_GRANULARITY) {
            return false;
        }
        let parent = self.parent(attr);
        self.push(Aggregation::by_name(attr, parent));
        true
    }

    /// Add a string prefix aggregation if any `<attr>-offset` values are present.
    pub fn maybe_add_string_prefix_aggregation(&mut self, attr: &str) -> Result<bool> {
        if self.has_aggregation(attr) {
            return Ok(false);
        }
        let Some(raw_offsets) = self.params.parameter_values(&format!("{attr}-offset")) else {
            return Ok(false);
        };
        let offsets = raw_offsets
            .iter()
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|offset| *offset > 0)
                    .ok_or_else(|| RequestError::InvalidOffset {
                        attribute: attr.to_string(),
                        value: raw.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let parent = self.parent(attr);
        let aggregation =
            Aggregation::string_prefix(attr, parent, offsets).map_err(|e| config_error(attr, e))?;
        self.push(aggregation);
        Ok(true)
    }

    /// The aggregations, in the order their attributes were added.
    pub fn to_list(&self) -> &[Aggregation] {
        &self.result
    }

    /// The aggregations as an unordered, deduplicated set.
    pub fn to_set(&self) -> HashSet<Aggregation> {
        self.result.iter().cloned().collect()
    }

    pub fn into_list(self) -> Vec<Aggregation> {
        self.result
    }

    fn push(&mut self, aggregation: Aggregation) {
        tracing::debug!("Adding aggregation {:?}", aggregation);
        self.result.push(aggregation);
    }

    fn has_aggregation(&self, attr: &str) -> bool {
        let present = self.result.iter().any(|a| a.attribute_name() == attr);
        if present {
            tracing::debug!("Attribute {} already aggregated, skipping", attr);
        }
        present
    }

    fn granularity(&self, attr: &str) -> Option<&'a str> {
        self.params.parameter(&format!("{attr}-granularity"))
    }

    /// A non-empty granularity other than `by-name`.
    fn quantizing_granularity(&self, attr: &str) -> Option<&'a str> {
        self.granularity(attr)
            .filter(|g| !g.is_empty() && *g != BY_NAME_GRANULARITY)
    }

    fn parent(&self, attr: &str) -> Option<String> {
        self.params
            .parameter(&format!("{attr}-parent"))
            .map(str::to_string)
    }
}

fn config_error(attr: &str, source: ConfigError) -> RequestError {
    RequestError::Config {
        attribute: attr.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::QueryParameters;
    use scandigest_core::{DateGranularity, IntegerGranularity};

    #[test]
    fn test_no_parameters_no_aggregations() {
        let params = QueryParameters::new();
        let mut builder = AggregationBuilder::new(&params);
        assert!(!builder.maybe_add("bizDate", AttributeType::Date).unwrap());
        assert!(!builder.maybe_add("name", AttributeType::String).unwrap());
        assert!(builder.to_list().is_empty());
    }

    #[test]
    fn test_date_aggregation_with_parent() {
        let params = QueryParameters::parse("bizDate-granularity=daily&bizDate-parent=2009-06");
        let mut builder = AggregationBuilder::new(&params);
        assert!(builder.maybe_add_date_aggregation("bizDate").unwrap());
        assert_eq!(
            builder.to_list(),
            &[Aggregation::date(
                "bizDate",
                DateGranularity::Daily,
                Some("2009-06".into())
            )]
        );
    }

    #[test]
    fn test_date_builder_ignores_by_name_and_empty() {
        let params = QueryParameters::parse("a-granularity=by-name&b-granularity=");
        let mut builder = AggregationBuilder::new(&params);
        assert!(!builder.maybe_add_date_aggregation("a").unwrap());
        assert!(!builder.maybe_add_date_aggregation("b").unwrap());
        assert!(!builder.maybe_add_integer_aggregation("a").unwrap());
    }

    #[test]
    fn test_integer_aggregation() {
        let params = QueryParameters::parse("count-granularity=100s");
        let mut builder = AggregationBuilder::new(&params);
        assert!(builder.maybe_add("count", AttributeType::Integer).unwrap());
        assert_eq!(
            builder.into_list(),
            vec![Aggregation::integer(
                "count",
                IntegerGranularity::new(100).unwrap(),
                None
            )]
        );
    }

    #[test]
    fn test_invalid_granularity() {
        let params = QueryParameters::parse("count-granularity=weekly");
        let mut builder = AggregationBuilder::new(&params);
        let err = builder.maybe_add("count", AttributeType::Integer).unwrap_err();
        assert!(matches!(
            err,
            RequestError::Config { ref attribute, source: ConfigError::InvalidGranularity(_) }
                if attribute == "count"
        ));
    }

    #[test]
    fn test_by_name_wins_for_any_type() {
        let params = QueryParameters::parse("someString-granularity=by-name&when-granularity=by-name");
        let mut builder = AggregationBuilder::new(&params);
        builder.maybe_add("someString", AttributeType::String).unwrap();
        builder.maybe_add("when", AttributeType::Date).unwrap();
        assert_eq!(
            builder.to_list(),
            &[
                Aggregation::by_name("someString", None),
                Aggregation::by_name("when", None)
            ]
        );
    }

    #[test]
    fn test_string_prefix_offsets() {
        let params = QueryParameters::parse("name-offset=1&name-offset=3&name-parent=a");
        let mut builder = AggregationBuilder::new(&params);
        assert!(builder.maybe_add("name", AttributeType::String).unwrap());
        assert_eq!(
            builder.to_list(),
            &[Aggregation::string_prefix("name", Some("a".into()), vec![1, 3]).unwrap()]
        );
    }

    #[test]
    fn test_bad_offsets() {
        for query in ["name-offset=x", "name-offset=0", "name-offset=-2"] {
            let params = QueryParameters::parse(query);
            let mut builder = AggregationBuilder::new(&params);
            assert!(matches!(
                builder.maybe_add_string_prefix_aggregation("name"),
                Err(RequestError::InvalidOffset { .. })
            ));
        }

        let params = QueryParameters::parse("name-offset=3&name-offset=2");
        let mut builder = AggregationBuilder::new(&params);
        assert!(matches!(
            builder.maybe_add_string_prefix_aggregation("name"),
            Err(RequestError::Config {
                source: ConfigError::InvalidOffset { offset: 2 },
                ..
            })
        ));
    }

    #[test]
    fn test_string_attribute_with_quantizing_granularity() {
        let params = QueryParameters::parse("name-granularity=daily");
        let mut builder = AggregationBuilder::new(&params);
        assert!(builder.maybe_add("name", AttributeType::String).is_err());
    }

    #[test]
    fn test_list_preserves_order_and_set_dedups() {
        let params = QueryParameters::parse("b-granularity=by-name&a-granularity=monthly");
        let mut builder = AggregationBuilder::new(&params);
        assert!(builder.maybe_add("b", AttributeType::String).unwrap());
        assert!(builder.maybe_add("a", AttributeType::Date).unwrap());
        assert!(!builder.maybe_add("b", AttributeType::String).unwrap());

        let names: Vec<_> = builder.to_list().iter().map(|a| a.attribute_name()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(builder.to_set().len(), 2);
    }

    #[test]
    fn test_one_aggregation_per_attribute() {
        let params = QueryParameters::parse("a-granularity=by-name&a-offset=2&n-granularity=10s");
        let mut builder = AggregationBuilder::new(&params);
        assert!(builder.maybe_add_by_name_aggregation("a"));
        assert!(!builder.maybe_add_string_prefix_aggregation("a").unwrap());
        assert!(!builder.maybe_add_date_aggregation("a").unwrap());
        assert!(builder.maybe_add_integer_aggregation("n").unwrap());
        assert!(!builder.maybe_add_integer_aggregation("n").unwrap());
        assert!(!builder.maybe_add_by_name_aggregation("n"));
        assert_eq!(
            builder.to_list(),
            &[
                Aggregation::by_name("a", None),
                Aggregation::integer("n", IntegerGranularity::new(10).unwrap(), None)
            ]
        );
    }

    #[test]
    fn test_attribute_type_parse() {
        assert_eq!("datetime".parse::<AttributeType>().unwrap(), AttributeType::DateTime);
        assert_eq!("int".parse::<AttributeType>().unwrap(), AttributeType::Integer);
        assert_eq!(AttributeType::Integer.to_string(), "int");
        assert!(matches!(
            "float".parse::<AttributeType>(),
            Err(RequestError::UnknownAttributeType(_))
        ));
    }
}
