//! 表情的额外参数模型。
//!
//! 每个表情可以声明一组结构化参数（字段名、类型、默认值），请求中的
//! `args` JSON 会按照声明逐字段校验，缺省字段使用默认值，未声明的字段被忽略。

use std::fmt;

use serde_json::{json, Map, Value};

/// 按表情 key 分派的参数解码能力
pub trait ArgsDecoder: Send + Sync + fmt::Debug {
    /// 校验并补全参数，失败时返回可直接展示给调用方的错误信息
    fn decode(&self, raw: &Value) -> Result<Map<String, Value>, String>;

    fn defaults(&self) -> Map<String, Value>;

    fn json_schema(&self) -> Value;
}

#[derive(Debug, Clone)]
pub enum ArgKind {
    Bool,
    Integer { min: Option<i64>, max: Option<i64> },
    Number { min: Option<f64>, max: Option<f64> },
    Text { choices: Option<Vec<&'static str>> },
}

#[derive(Debug, Clone)]
pub struct ArgField {
    pub name: &'static str,
    pub kind: ArgKind,
    pub default: Value,
    pub description: &'static str,
}

impl ArgField {
    pub fn boolean(name: &'static str, default: bool, description: &'static str) -> Self {
        Self { name, kind: ArgKind::Bool, default: Value::Bool(default), description }
    }

    pub fn integer(
        name: &'static str,
        default: i64,
        min: Option<i64>,
        max: Option<i64>,
        description: &'static str,
    ) -> Self {
        Self { name, kind: ArgKind::Integer { min, max }, default: json!(default), description }
    }

    pub fn number(
        name: &'static str,
        default: f64,
        min: Option<f64>,
        max: Option<f64>,
        description: &'static str,
    ) -> Self {
        Self { name, kind: ArgKind::Number { min, max }, default: json!(default), description }
    }

    pub fn choice(
        name: &'static str,
        default: &'static str,
        choices: &[&'static str],
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: ArgKind::Text { choices: Some(choices.to_vec()) },
            default: json!(default),
            description,
        }
    }

    pub fn text(name: &'static str, default: &'static str, description: &'static str) -> Self {
        Self { name, kind: ArgKind::Text { choices: None }, default: json!(default), description }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        match &self.kind {
            ArgKind::Bool => match value {
                Value::Bool(_) => Ok(()),
                _ => Err("Input should be a valid boolean".to_string()),
            },
            ArgKind::Integer { min, max } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| "Input should be a valid integer".to_string())?;
                check_bounds(n, *min, *max)
            }
            ArgKind::Number { min, max } => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| "Input should be a valid number".to_string())?;
                check_bounds(n, *min, *max)
            }
            ArgKind::Text { choices } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| "Input should be a valid string".to_string())?;
                match choices {
                    Some(choices) if !choices.iter().any(|c| *c == s) => {
                        let expected = choices
                            .iter()
                            .map(|c| format!("'{}'", c))
                            .collect::<Vec<_>>()
                            .join(" or ");
                        Err(format!("Input should be {}", expected))
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    fn schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("title".into(), json!(title_case(self.name)));
        let ty = match &self.kind {
            ArgKind::Bool => "boolean",
            ArgKind::Integer { min, max } => {
                if let Some(min) = min {
                    prop.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    prop.insert("maximum".into(), json!(max));
                }
                "integer"
            }
            ArgKind::Number { min, max } => {
                if let Some(min) = min {
                    prop.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    prop.insert("maximum".into(), json!(max));
                }
                "number"
            }
            ArgKind::Text { choices } => {
                if let Some(choices) = choices {
                    prop.insert("enum".into(), json!(choices));
                }
                "string"
            }
        };
        prop.insert("type".into(), json!(ty));
        prop.insert("default".into(), self.default.clone());
        prop.insert("description".into(), json!(self.description));
        Value::Object(prop)
    }
}

fn check_bounds<T: PartialOrd + fmt::Display>(
    n: T,
    min: Option<T>,
    max: Option<T>,
) -> Result<(), String> {
    if let Some(min) = min {
        if n < min {
            return Err(format!("Input should be greater than or equal to {}", min));
        }
    }
    if let Some(max) = max {
        if n > max {
            return Err(format!("Input should be less than or equal to {}", max));
        }
    }
    Ok(())
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 由字段列表声明的参数模型
#[derive(Debug, Clone)]
pub struct ArgsModel {
    title: &'static str,
    fields: Vec<ArgField>,
}

impl ArgsModel {
    pub fn new(title: &'static str, fields: Vec<ArgField>) -> Self {
        Self { title, fields }
    }
}

impl ArgsDecoder for ArgsModel {
    fn decode(&self, raw: &Value) -> Result<Map<String, Value>, String> {
        let Some(input) = raw.as_object() else {
            return Err(format!(
                "1 validation error for {}\n  Input should be a valid dictionary or instance of {}",
                self.title, self.title
            ));
        };

        let mut decoded = Map::new();
        let mut errors = Vec::new();
        for field in &self.fields {
            match input.get(field.name) {
                None => {
                    decoded.insert(field.name.to_string(), field.default.clone());
                }
                Some(value) => match field.check(value) {
                    Ok(()) => {
                        decoded.insert(field.name.to_string(), value.clone());
                    }
                    Err(reason) => errors.push(format!("{}\n  {}", field.name, reason)),
                },
            }
        }

        if errors.is_empty() {
            return Ok(decoded);
        }
        let plural = if errors.len() == 1 { "" } else { "s" };
        Err(format!(
            "{} validation error{} for {}\n{}",
            errors.len(),
            plural,
            self.title,
            errors.join("\n")
        ))
    }

    fn defaults(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), f.default.clone()))
            .collect()
    }

    fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.schema()))
            .collect();
        json!({
            "title": self.title,
            "type": "object",
            "properties": properties,
        })
    }
}

/// 不接受任何参数的表情使用的解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyArgs;

impl ArgsDecoder for EmptyArgs {
    fn decode(&self, raw: &Value) -> Result<Map<String, Value>, String> {
        if raw.is_object() {
            Ok(Map::new())
        } else {
            Err("1 validation error for MemeArgsModel\n  Input should be a valid dictionary".to_string())
        }
    }

    fn defaults(&self) -> Map<String, Value> {
        Map::new()
    }

    fn json_schema(&self) -> Value {
        json!({
            "title": "MemeArgsModel",
            "type": "object",
            "properties": {},
        })
    }
}
