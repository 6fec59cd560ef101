// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Conversions between `serde_json::Value` payloads and the CRDT library's
//! `Any` representation. Integers survive as `BigInt`, everything else maps
//! structurally; non-JSON values (buffers, undefined) degrade to null.

use std::collections::HashMap;

use serde_json::{Map as JsonMap, Number, Value};
use yrs::types::ToJson;
use yrs::{Any, GetString, Out, ReadTxn};

pub(crate) fn any_from_value(value: &Value) -> Any {
    match value {
        Value::Null => Any::Null,
        Value::Bool(flag) => Any::Bool(*flag),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Any::BigInt(int)
            } else {
                Any::Number(number.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(text) => Any::String(text.as_str().into()),
        Value::Array(items) => {
            Any::Array(items.iter().map(any_from_value).collect::<Vec<_>>().into())
        }
        Value::Object(entries) => Any::Map(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), any_from_value(value)))
                .collect::<HashMap<_, _>>()
                .into(),
        ),
    }
}

pub(crate) fn value_from_any(any: &Any) -> Value {
    match any {
        Any::Null | Any::Undefined => Value::Null,
        Any::Bool(flag) => Value::Bool(*flag),
        Any::Number(number) => Number::from_f64(*number).map_or(Value::Null, Value::Number),
        Any::BigInt(int) => Value::Number(Number::from(*int)),
        Any::String(text) => Value::String(text.to_string()),
        Any::Buffer(_) => Value::Null,
        Any::Array(items) => Value::Array(items.iter().map(value_from_any).collect()),
        Any::Map(entries) => {
            let mut object = JsonMap::new();
            for (key, value) in entries.iter() {
                object.insert(key.clone(), value_from_any(value));
            }
            Value::Object(object)
        }
    }
}

pub(crate) fn value_from_out<T: ReadTxn>(out: &Out, txn: &T) -> Value {
    match out {
        Out::Any(any) => value_from_any(any),
        Out::YMap(map) => value_from_any(&map.to_json(txn)),
        Out::YArray(array) => value_from_any(&array.to_json(txn)),
        Out::YText(text) => Value::String(text.get_string(txn)),
        _ => Value::Null,
    }
}
