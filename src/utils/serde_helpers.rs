/// 用于处理 SurrealDB Thing ID 的序列化/反序列化辅助模块

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// 把记录 ID 还原为不带表名的纯 ID（例如: "post:⟨xxxx⟩" -> "xxxx"）
pub fn strip_record_id(raw: &str) -> String {
    let id = match raw.split_once(':') {
        Some((_, rest)) => rest,
        None => raw,
    };

    id.trim_start_matches(|c| c == '⟨' || c == '`')
        .trim_end_matches(|c| c == '⟩' || c == '`')
        .to_string()
}

fn id_value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        // 枚举形式的 ID，例如 {"String": "xxxx"}
        Value::Object(map) => map
            .into_iter()
            .next()
            .map(|(_, inner)| id_value_to_string(inner))
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

/// 处理 SurrealDB 的 Thing ID 格式，对外统一暴露纯 ID
pub mod thing_id {
    use super::*;

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(id)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IdValue {
            String(String),
            Thing {
                #[allow(dead_code)]
                tb: String,
                id: Value,
            },
        }

        match IdValue::deserialize(deserializer)? {
            IdValue::String(s) => Ok(strip_record_id(&s)),
            IdValue::Thing { id, .. } => Ok(id_value_to_string(id)),
        }
    }
}
