// src/answer/normalize.rs

use serde_json::{Map, Value};
use tracing::{instrument, trace};

use super::types::StructuredAnswer;
use crate::error::{Error, Result};

/// Convert a structured-answer payload into a [`StructuredAnswer`].
///
/// `answer` and `aggregator` must be strings. `coordinates` and `cells` may be
/// absent (treated as empty) but, when present, every element must have the
/// expected shape and the two lists must be the same length.
#[instrument(level = "debug", skip(payload))]
pub fn normalize(payload: &Value) -> Result<StructuredAnswer> {
    let obj = payload
        .as_object()
        .ok_or_else(|| Error::Schema(format!("expected an object, got {}", kind(payload))))?;

    let answer = required_str(obj, "answer")?;
    let aggregator = required_str(obj, "aggregator")?;

    let coordinates = optional_array(obj, "coordinates")?
        .iter()
        .enumerate()
        .map(|(i, pair)| coordinate(i, pair))
        .collect::<Result<Vec<_>>>()?;

    let cells: Vec<String> = optional_array(obj, "cells")?
        .iter()
        .map(render_cell)
        .collect();

    if coordinates.len() != cells.len() {
        return Err(Error::Schema(format!(
            "{} coordinates but {} cells",
            coordinates.len(),
            cells.len()
        )));
    }

    trace!(cells = cells.len(), aggregator = %aggregator, "normalized answer");
    Ok(StructuredAnswer {
        answer,
        coordinates,
        cells,
        aggregator,
    })
}

fn required_str(obj: &Map<String, Value>, key: &str) -> Result<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::Schema(format!(
            "`{}` must be a string, got {}",
            key,
            kind(other)
        ))),
        None => Err(Error::Schema(format!("`{}` is missing", key))),
    }
}

fn optional_array<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a [Value]> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(Error::Schema(format!(
            "`{}` must be a list, got {}",
            key,
            kind(other)
        ))),
    }
}

fn coordinate(index: usize, pair: &Value) -> Result<(i64, i64)> {
    let bad = |what: &str| Error::Schema(format!("coordinates[{}]: {}", index, what));
    let items = pair
        .as_array()
        .ok_or_else(|| bad(&format!("expected a pair, got {}", kind(pair))))?;
    match items.as_slice() {
        [row, col] => {
            let row = truncate(row).ok_or_else(|| bad("row is not a number"))?;
            let col = truncate(col).ok_or_else(|| bad("column is not a number"))?;
            Ok((row, col))
        }
        _ => Err(bad(&format!("expected 2 elements, got {}", items.len()))),
    }
}

/// Integer value of a JSON number, dropping any fractional part.
fn truncate(v: &Value) -> Option<i64> {
    let Value::Number(n) = v else {
        return None;
    };
    n.as_i64()
        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

/// Numbers get one fractional digit, strings pass through, anything else is
/// rendered as compact JSON.
fn render_cell(v: &Value) -> String {
    match v {
        Value::Number(n) => match n.as_f64() {
            Some(f) => format!("{:.1}", f),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_err(payload: Value) -> String {
        match normalize(&payload) {
            Err(Error::Schema(msg)) => msg,
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn numeric_cells_get_one_decimal() {
        let a = normalize(&json!({
            "answer": "x",
            "coordinates": [[0, 1]],
            "cells": [42.0],
            "aggregator": "SUM"
        }))
        .unwrap();
        assert_eq!(a.cells, vec!["42.0"]);
        assert_eq!(a.coordinates, vec![(0, 1)]);
        assert_eq!(a.answer, "x");
        assert_eq!(a.aggregator, "SUM");
    }

    #[test]
    fn mixed_cells_render_naturally() {
        let a = normalize(&json!({
            "answer": "SUM > 3.5, SUM > 2.26",
            "coordinates": [[0, 1], [1, 1], [2, 0], [3, 0]],
            "cells": ["3.5", 2.26, 7, true],
            "aggregator": "SUM"
        }))
        .unwrap();
        assert_eq!(a.cells, vec!["3.5", "2.3", "7.0", "true"]);
    }

    #[test]
    fn fractional_coordinates_truncate() {
        let a = normalize(&json!({
            "answer": "",
            "coordinates": [[1.9, 2.2], [-0.5, 3]],
            "cells": ["a", "b"],
            "aggregator": "NONE"
        }))
        .unwrap();
        assert_eq!(a.coordinates, vec![(1, 2), (0, 3)]);
    }

    #[test]
    fn absent_lists_are_empty() {
        let a = normalize(&json!({"answer": "none", "aggregator": "NONE", "cells": null})).unwrap();
        assert!(a.coordinates.is_empty());
        assert!(a.cells.is_empty());
    }

    #[test]
    fn missing_answer_fails() {
        let msg = schema_err(json!({"coordinates": [], "cells": [], "aggregator": "SUM"}));
        assert!(msg.contains("answer"));
    }

    #[test]
    fn non_string_aggregator_fails() {
        let msg = schema_err(json!({"answer": "x", "aggregator": 3}));
        assert!(msg.contains("aggregator"));
    }

    #[test]
    fn non_numeric_coordinate_fails() {
        let msg = schema_err(json!({
            "answer": "x",
            "coordinates": [[0, "one"]],
            "cells": ["1"],
            "aggregator": "SUM"
        }));
        assert!(msg.contains("coordinates[0]"));
    }

    #[test]
    fn short_pair_fails() {
        schema_err(json!({
            "answer": "x",
            "coordinates": [[0, 1], [2]],
            "cells": ["1", "2"],
            "aggregator": "SUM"
        }));
    }

    #[test]
    fn coordinates_and_cells_must_line_up() {
        let msg = schema_err(json!({
            "answer": "x",
            "coordinates": [[0, 1], [1, 1]],
            "cells": ["1"],
            "aggregator": "SUM"
        }));
        assert!(msg.contains("2 coordinates"));
    }

    #[test]
    fn non_object_payload_fails() {
        schema_err(json!([{"generated_text": "hi"}]));
        schema_err(json!("just text"));
    }
}
