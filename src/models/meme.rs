use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::memes::canvas;
use crate::models::args::{ArgsDecoder, EmptyArgs};
use crate::utils::error::MemeError;

/// 传给具体表情渲染函数的输入
pub struct MemeInput<'a> {
    pub images: Vec<DynamicImage>,
    pub texts: &'a [String],
    pub args: &'a Map<String, Value>,
}

pub type MemeFunction = fn(MemeInput<'_>) -> Result<Vec<u8>, MemeError>;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParserArg {
    pub name: String,
    pub value: String,
    #[schema(value_type = Option<Object>)]
    pub default: Option<Value>,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// 命令式调用时参数的解析选项
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParserOption {
    pub names: Vec<String>,
    #[serde(default)]
    pub args: Vec<ParserArg>,
    pub dest: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub default: Option<Value>,
    pub action: Option<ParserAction>,
    pub help_text: Option<String>,
    #[serde(default)]
    pub compact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParserAction {
    Store,
    StoreTrue,
    StoreFalse,
    StoreConst,
    Append,
}

impl ParserOption {
    /// `--name <value>` 形式的取值选项
    pub fn value(names: &[&str], dest: &str, value: &str, help_text: &str) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            args: vec![ParserArg {
                name: dest.to_string(),
                value: value.to_string(),
                default: None,
                flags: Vec::new(),
            }],
            dest: Some(dest.to_string()),
            default: None,
            action: Some(ParserAction::Store),
            help_text: Some(help_text.to_string()),
            compact: false,
        }
    }

    /// 出现即把 `dest` 设为 `constant` 的开关选项
    pub fn constant(names: &[&str], dest: &str, constant: Value, help_text: &str) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            args: Vec::new(),
            dest: Some(dest.to_string()),
            default: Some(constant),
            action: Some(ParserAction::StoreConst),
            help_text: Some(help_text.to_string()),
            compact: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommandShortcut {
    /// 触发快捷指令的正则
    pub key: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub humanized: Option<String>,
}

impl CommandShortcut {
    pub fn new(key: &str, args: &[&str], humanized: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            humanized: humanized.map(str::to_string),
        }
    }

    pub fn display(&self) -> &str {
        self.humanized.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Clone)]
pub struct MemeArgsType {
    pub args_model: Arc<dyn ArgsDecoder>,
    pub args_examples: Vec<Map<String, Value>>,
    pub parser_options: Vec<ParserOption>,
}

impl fmt::Debug for MemeArgsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemeArgsType")
            .field("args_model", &self.args_model)
            .field("args_examples", &self.args_examples)
            .field("parser_options", &self.parser_options.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MemeParamsType {
    pub min_images: u32,
    pub max_images: u32,
    pub min_texts: u32,
    pub max_texts: u32,
    pub default_texts: Vec<String>,
    pub args_type: Option<MemeArgsType>,
}

/// 按输入需求划分的分类；既不需要图片也不需要文字的表情不属于任何分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemeCategory {
    TextOnly,
    ImageOnly,
    Mixed,
}

impl MemeParamsType {
    pub fn category(&self) -> Option<MemeCategory> {
        if self.min_images == 0 && self.max_images == 0 && self.min_texts >= 1 {
            Some(MemeCategory::TextOnly)
        } else if self.min_texts == 0 && self.max_texts == 0 && self.min_images >= 1 {
            Some(MemeCategory::ImageOnly)
        } else if self.min_images >= 1 && self.min_texts >= 1 {
            Some(MemeCategory::Mixed)
        } else {
            None
        }
    }

    pub fn args_decoder(&self) -> &dyn ArgsDecoder {
        match &self.args_type {
            Some(args_type) => args_type.args_model.as_ref(),
            None => &EmptyArgs,
        }
    }

    /// 示例参数优先，没有示例时使用模型默认值
    pub fn example_args(&self) -> Map<String, Value> {
        match &self.args_type {
            Some(args_type) => args_type
                .args_examples
                .first()
                .cloned()
                .unwrap_or_else(|| args_type.args_model.defaults()),
            None => Map::new(),
        }
    }
}

#[derive(Clone)]
pub struct Meme {
    pub key: String,
    pub params_type: MemeParamsType,
    pub keywords: Vec<String>,
    pub shortcuts: Vec<CommandShortcut>,
    pub tags: BTreeSet<String>,
    pub date_created: OffsetDateTime,
    pub date_modified: OffsetDateTime,
    pub function: MemeFunction,
}

impl fmt::Debug for Meme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meme")
            .field("key", &self.key)
            .field("params_type", &self.params_type)
            .field("keywords", &self.keywords)
            .finish_non_exhaustive()
    }
}

impl Meme {
    pub fn builder(key: &str, function: MemeFunction) -> MemeBuilder {
        MemeBuilder::new(key, function)
    }

    pub fn decode_args(&self, raw: &Value) -> Result<Map<String, Value>, MemeError> {
        self.params_type
            .args_decoder()
            .decode(raw)
            .map_err(MemeError::ArgModelMismatch)
    }

    /// 校验图片与文字数量、参数，然后调用渲染函数
    pub fn generate(
        &self,
        images: Vec<Vec<u8>>,
        texts: Vec<String>,
        args: &Value,
    ) -> Result<Vec<u8>, MemeError> {
        let params = &self.params_type;
        let image_count = images.len() as u32;
        if image_count < params.min_images || image_count > params.max_images {
            return Err(MemeError::ImageNumberMismatch {
                min: params.min_images,
                max: params.max_images,
            });
        }
        let text_count = texts.len() as u32;
        if text_count < params.min_texts || text_count > params.max_texts {
            return Err(MemeError::TextNumberMismatch {
                min: params.min_texts,
                max: params.max_texts,
            });
        }
        let args = self.decode_args(args)?;

        let images = images
            .iter()
            .map(|bytes| {
                image::load_from_memory(bytes)
                    .map_err(|e| MemeError::OpenImageFailed(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        (self.function)(MemeInput {
            images,
            texts: &texts,
            args: &args,
        })
    }

    /// 使用内置头像、默认文字和示例参数渲染预览
    pub fn generate_preview(&self) -> Result<Vec<u8>, MemeError> {
        let params = &self.params_type;
        let avatar = canvas::encode_png(&canvas::placeholder_avatar())?;
        let images = vec![avatar; params.min_images as usize];

        let texts = if params.default_texts.is_empty() {
            vec![self.key.clone(); params.min_texts as usize]
        } else {
            params.default_texts.clone()
        };

        self.generate(images, texts, &Value::Object(params.example_args()))
    }
}

pub struct MemeBuilder {
    meme: Meme,
}

impl MemeBuilder {
    fn new(key: &str, function: MemeFunction) -> Self {
        Self {
            meme: Meme {
                key: key.to_string(),
                params_type: MemeParamsType {
                    min_images: 0,
                    max_images: 0,
                    min_texts: 0,
                    max_texts: 0,
                    default_texts: Vec::new(),
                    args_type: None,
                },
                keywords: Vec::new(),
                shortcuts: Vec::new(),
                tags: BTreeSet::new(),
                date_created: OffsetDateTime::UNIX_EPOCH,
                date_modified: OffsetDateTime::UNIX_EPOCH,
                function,
            },
        }
    }

    pub fn images(mut self, min: u32, max: u32) -> Self {
        self.meme.params_type.min_images = min;
        self.meme.params_type.max_images = max;
        self
    }

    pub fn texts(mut self, min: u32, max: u32) -> Self {
        self.meme.params_type.min_texts = min;
        self.meme.params_type.max_texts = max;
        self
    }

    pub fn default_texts(mut self, texts: &[&str]) -> Self {
        self.meme.params_type.default_texts = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn args(
        mut self,
        model: impl ArgsDecoder + 'static,
        examples: Vec<Map<String, Value>>,
        parser_options: Vec<ParserOption>,
    ) -> Self {
        self.meme.params_type.args_type = Some(MemeArgsType {
            args_model: Arc::new(model),
            args_examples: examples,
            parser_options,
        });
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.meme.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn shortcut(mut self, shortcut: CommandShortcut) -> Self {
        self.meme.shortcuts.push(shortcut);
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.meme.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn dates(mut self, created: OffsetDateTime, modified: OffsetDateTime) -> Self {
        self.meme.date_created = created;
        self.meme.date_modified = modified;
        self
    }

    pub fn build(self) -> Meme {
        self.meme
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemeArgsResponse {
    #[schema(value_type = Object)]
    pub args_model: Value,
    #[schema(value_type = Vec<Object>)]
    pub args_examples: Vec<Map<String, Value>>,
    pub parser_options: Vec<ParserOption>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemeParamsResponse {
    pub min_images: u32,
    pub max_images: u32,
    pub min_texts: u32,
    pub max_texts: u32,
    pub default_texts: Vec<String>,
    pub args_type: Option<MemeArgsResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemeInfoResponse {
    #[schema(example = "mirror")]
    pub key: String,
    pub params_type: MemeParamsResponse,
    pub keywords: Vec<String>,
    pub shortcuts: Vec<CommandShortcut>,
    #[schema(value_type = Vec<String>)]
    pub tags: BTreeSet<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub date_created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub date_modified: OffsetDateTime,
}

impl From<&Meme> for MemeInfoResponse {
    fn from(meme: &Meme) -> Self {
        let params = &meme.params_type;
        let args_type = params.args_type.as_ref().map(|args_type| MemeArgsResponse {
            args_model: args_type.args_model.json_schema(),
            args_examples: args_type.args_examples.clone(),
            parser_options: args_type.parser_options.clone(),
        });

        Self {
            key: meme.key.clone(),
            params_type: MemeParamsResponse {
                min_images: params.min_images,
                max_images: params.max_images,
                min_texts: params.min_texts,
                max_texts: params.max_texts,
                default_texts: params.default_texts.clone(),
                args_type,
            },
            keywords: meme.keywords.clone(),
            shortcuts: meme.shortcuts.clone(),
            tags: meme.tags.clone(),
            date_created: meme.date_created,
            date_modified: meme.date_modified,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct MemeCategories {
    pub all: Vec<String>,
    pub text_only: Vec<String>,
    pub image_only: Vec<String>,
    pub mixed: Vec<String>,
}
