//! Decoding of `/query` responses.
//!
//! The server does not tag result items. What a result means depends on the
//! query that produced it, and the only thing the client can see is its JSON
//! shape:
//!
//! | shape   | produced by             | decoded as                    |
//! |---------|-------------------------|-------------------------------|
//! | object  | `Bitmap`, `Union`, ...  | [`QueryResult::Bitmap`]       |
//! | array   | `TopN`                  | [`QueryResult::CountItems`]   |
//! | integer | `Count`                 | [`QueryResult::Count`]        |
//! | boolean | `SetBit`, `ClearBit`    | [`QueryResult::Changed`]      |
//! | null    | attribute setters       | [`QueryResult::Empty`]        |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A single attribute value attached to a bitmap or profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// Set bits of a row plus its attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BitmapResult {
    pub bits: Vec<u64>,
    #[serde(rename = "attrs")]
    pub attributes: Attributes,
}

/// One row of a TopN answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResultItem {
    pub id: u64,
    pub count: u64,
}

/// Attributes of a single column, returned when profiles are requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileItem {
    pub id: u64,
    #[serde(rename = "attrs")]
    pub attributes: Attributes,
}

#[derive(Deserialize)]
struct WireBitmap {
    #[serde(default)]
    bits: Option<Vec<u64>>,
    #[serde(default)]
    attrs: Option<Attributes>,
}

#[derive(Deserialize)]
struct WireProfile {
    id: u64,
    #[serde(default)]
    attrs: Option<Attributes>,
}

/// The decoded form of one entry of `results`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Bitmap(BitmapResult),
    CountItems(Vec<CountResultItem>),
    Count(u64),
    Changed(bool),
    Empty,
}

enum ResultShape {
    Object,
    Array,
    Integer(u64),
    Boolean(bool),
    Null,
    Unsupported(&'static str),
}

impl ResultShape {
    fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => ResultShape::Object,
            Value::Array(_) => ResultShape::Array,
            Value::Number(n) => match n.as_u64() {
                Some(count) => ResultShape::Integer(count),
                None => ResultShape::Unsupported("negative or fractional number"),
            },
            Value::Bool(b) => ResultShape::Boolean(*b),
            Value::Null => ResultShape::Null,
            Value::String(_) => ResultShape::Unsupported("string"),
        }
    }
}

impl QueryResult {
    /// Classify one result item by its JSON shape and decode it.
    pub fn from_value(value: Value) -> Result<Self> {
        match ResultShape::of(&value) {
            ResultShape::Object => {
                let wire: WireBitmap = serde_json::from_value(value)?;
                Ok(QueryResult::Bitmap(BitmapResult {
                    bits: wire.bits.unwrap_or_default(),
                    attributes: wire.attrs.unwrap_or_default(),
                }))
            }
            ResultShape::Array => Ok(QueryResult::CountItems(serde_json::from_value(value)?)),
            ResultShape::Integer(count) => Ok(QueryResult::Count(count)),
            ResultShape::Boolean(changed) => Ok(QueryResult::Changed(changed)),
            ResultShape::Null => Ok(QueryResult::Empty),
            ResultShape::Unsupported(shape) => Err(Error::Decode {
                message: format!("unsupported result shape: {}", shape),
            }),
        }
    }

    pub fn bitmap(&self) -> Option<&BitmapResult> {
        match self {
            QueryResult::Bitmap(bitmap) => Some(bitmap),
            _ => None,
        }
    }

    /// TopN items, or an empty slice for any other result.
    pub fn count_items(&self) -> &[CountResultItem] {
        match self {
            QueryResult::CountItems(items) => items,
            _ => &[],
        }
    }

    /// The count carried by this result; zero when it is not a count.
    pub fn count(&self) -> u64 {
        match self {
            QueryResult::Count(count) => *count,
            QueryResult::Changed(changed) => u64::from(*changed),
            _ => 0,
        }
    }
}

/// Decoded response of a `/query` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResponse {
    pub results: Vec<QueryResult>,
    pub profiles: Vec<ProfileItem>,
}

impl QueryResponse {
    /// Decode a response body.
    ///
    /// An `error` key in the envelope becomes [`Error::Query`], whatever else
    /// the envelope carries.
    pub fn from_json(body: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(body)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut envelope) = value else {
            return Err(Error::Decode {
                message: "response is not a JSON object".to_string(),
            });
        };

        if let Some(error) = envelope.remove("error") {
            let message = match error {
                Value::String(message) => message,
                other => other.to_string(),
            };
            return Err(Error::Query { message });
        }

        let results = take_array(&mut envelope, "results")?
            .into_iter()
            .map(QueryResult::from_value)
            .collect::<Result<Vec<_>>>()?;

        let profiles = take_array(&mut envelope, "profiles")?
            .into_iter()
            .map(|value| {
                let wire: WireProfile = serde_json::from_value(value)?;
                Ok(ProfileItem {
                    id: wire.id,
                    attributes: wire.attrs.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { results, profiles })
    }

    /// First result, if any.
    pub fn result(&self) -> Option<&QueryResult> {
        self.results.first()
    }

    /// First profile, if any.
    pub fn profile(&self) -> Option<&ProfileItem> {
        self.profiles.first()
    }
}

fn take_array(envelope: &mut serde_json::Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match envelope.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Error::Decode {
            message: format!("'{}' is not an array", key),
        }),
    }
}
