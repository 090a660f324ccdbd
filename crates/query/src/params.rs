//! Parsing of raw client query parameters.
//!
//! `select`, `sort`, `page` and `limit` are reserved; every other key is a
//! field filter:
//!
//! - `field=value`: equality
//! - `field[op]=value` / `field_op=value` with `op` in `gt`, `gte`, `lt`,
//!   `lte`, `in` (`in` takes a comma-separated list)
//!
//! Field names are checked against the collection [`Schema`]; operator
//! keywords outside the allow-list are rejected, never passed through.

use crate::{
    Condition, FieldPath, Filter, FindQuery, ID_FIELD, Operator, Projection, QueryError, Scalar, Schema,
    SortDirection, SortKey,
};

const RESERVED: [&str; 4] = ["select", "sort", "page", "limit"];

/// Limits applied when the client omits or overshoots `limit`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: Filter,
    pub projection: Option<Projection>,
    pub sort: Vec<SortKey>,
    pub page: u32,
    pub limit: u32,
}

impl ListQuery {
    /// Build a query from `(key, value)` pairs.
    ///
    /// The input is only read; a fresh structure is returned.
    pub fn parse<'a, I>(params: I, schema: &Schema, options: &QueryOptions) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filter = Filter::new();
        let mut select = None;
        let mut sort = None;
        let mut page = None;
        let mut limit = None;

        for (key, value) in params {
            match key {
                "select" => select = Some(value),
                "sort" => sort = Some(value),
                "page" => page = Some(value),
                "limit" => limit = Some(value),
                _ => filter.push(parse_condition(key, value, schema)?),
            }
        }

        let projection = select.map(|s| parse_select(s, schema)).transpose()?;
        let sort = match sort {
            Some(s) => parse_sort(s, schema)?,
            None => vec![SortKey::desc("createdAt")],
        };

        let page = page.and_then(parse_positive).unwrap_or(1);
        let limit = limit
            .and_then(parse_positive)
            .unwrap_or(options.default_limit)
            .min(options.max_limit.max(1));

        Ok(Self {
            filter,
            projection,
            sort,
            page,
            limit,
        })
    }

    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// The store-level query for the requested page. The identity field is
    /// appended as a final tiebreak so page boundaries are deterministic.
    pub fn to_find(&self) -> FindQuery {
        let mut sort = self.sort.clone();
        if !sort.iter().any(|k| k.field.segments() == [ID_FIELD]) {
            sort.push(SortKey::asc(ID_FIELD));
        }
        FindQuery {
            filter: self.filter.clone(),
            sort,
            skip: self.skip(),
            limit: Some(u64::from(self.limit)),
        }
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

fn checked_path(raw: &str, schema: &Schema) -> Result<FieldPath, QueryError> {
    let path = FieldPath::parse(raw)?;
    if schema.is_queryable(path.root()) {
        Ok(path)
    } else {
        Err(QueryError::UnknownField(raw.to_string()))
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_select(raw: &str, schema: &Schema) -> Result<Projection, QueryError> {
    let fields = split_list(raw)
        .map(|f| checked_path(f, schema))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Projection::new(fields))
}

fn parse_sort(raw: &str, schema: &Schema) -> Result<Vec<SortKey>, QueryError> {
    let keys = split_list(raw)
        .map(|f| {
            let (name, direction) = match f.strip_prefix('-') {
                Some(name) => (name, SortDirection::Desc),
                None => (f, SortDirection::Asc),
            };
            Ok(SortKey {
                field: checked_path(name, schema)?,
                direction,
            })
        })
        .collect::<Result<Vec<_>, QueryError>>()?;

    if keys.is_empty() {
        Ok(vec![SortKey::desc("createdAt")])
    } else {
        Ok(keys)
    }
}

/// Split a filter key into field and operator.
///
/// Bracket form must name an allowed operator. Suffix form only applies when
/// the whole key is not itself a queryable field.
fn split_key<'k>(key: &'k str, schema: &Schema) -> Result<(&'k str, Operator), QueryError> {
    if let Some(open) = key.find('[') {
        let field = &key[..open];
        let op = key[open + 1..]
            .strip_suffix(']')
            .ok_or_else(|| QueryError::InvalidFieldName(key.to_string()))?;
        return match Operator::from_keyword(op) {
            Some(op) => Ok((field, op)),
            None => Err(QueryError::UnsupportedOperator {
                field: field.to_string(),
                op: op.to_string(),
            }),
        };
    }

    let whole_is_field = FieldPath::parse(key)
        .map(|p| schema.is_queryable(p.root()))
        .unwrap_or(false);
    if !whole_is_field {
        for op in Operator::KEYWORDS {
            let suffix = format!("_{}", op.keyword());
            if let Some(field) = key.strip_suffix(suffix.as_str()) {
                return Ok((field, op));
            }
        }
    }

    Ok((key, Operator::Eq))
}

fn parse_condition(key: &str, value: &str, schema: &Schema) -> Result<Condition, QueryError> {
    let (field, op) = split_key(key, schema)?;
    let field = checked_path(field, schema)?;

    let values: Vec<Scalar> = match op {
        Operator::In => split_list(value).map(Scalar::parse).collect(),
        _ => vec![Scalar::parse(value)],
    };
    if values.is_empty() {
        return Err(QueryError::EmptyList(field.to_string()));
    }

    Ok(Condition { field, op, values })
}
