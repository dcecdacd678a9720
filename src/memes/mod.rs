//! 内置表情目录。
//!
//! 每个子模块提供一个 `meme()` 构造函数和对应的渲染函数，服务启动时
//! 由 [`builtin`] 汇总后交给注册表。

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::models::meme::Meme;
use crate::utils::error::MemeError;

pub mod canvas;
pub mod list;

mod caption;
mod confetti;
mod grayscale;
mod mirror;
mod side_by_side;
mod sign;
mod spin;
mod two_choices;

pub fn builtin() -> Vec<Meme> {
    vec![
        caption::meme(),
        confetti::meme(),
        grayscale::meme(),
        mirror::meme(),
        side_by_side::meme(),
        sign::meme(),
        spin::meme(),
        two_choices::meme(),
    ]
}

/// 把已校验的参数转换成表情自己的参数结构
fn parse_args<T: DeserializeOwned>(args: &Map<String, Value>) -> Result<T, MemeError> {
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|e| MemeError::ArgMismatch(e.to_string()))
}

fn example(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
