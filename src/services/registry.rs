use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::memes;
use crate::models::meme::{Meme, MemeCategories, MemeCategory};
use crate::utils::error::{AppError, MemeError, Result};

/// 启动时构建、之后只读的表情注册表，按 key 排序
#[derive(Debug, Default)]
pub struct MemeRegistry {
    memes: BTreeMap<String, Arc<Meme>>,
}

impl MemeRegistry {
    pub fn new(memes: Vec<Meme>) -> Result<Self> {
        let mut table = BTreeMap::new();
        for meme in memes {
            let key = meme.key.clone();
            if table.insert(key.clone(), Arc::new(meme)).is_some() {
                return Err(AppError::Config(format!("表情 key 重复: {}", key)));
            }
        }
        Ok(Self { memes: table })
    }

    pub fn builtin() -> Result<Self> {
        let registry = Self::new(memes::builtin())?;
        info!("已加载 {} 个表情模版", registry.len());
        Ok(registry)
    }

    pub fn get(&self, key: &str) -> std::result::Result<Arc<Meme>, MemeError> {
        self.memes
            .get(key)
            .cloned()
            .ok_or_else(|| MemeError::NoSuchMeme(key.to_string()))
    }

    pub fn keys(&self) -> Vec<String> {
        self.memes.keys().cloned().collect()
    }

    pub fn memes(&self) -> impl Iterator<Item = &Arc<Meme>> {
        self.memes.values()
    }

    pub fn len(&self) -> usize {
        self.memes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memes.is_empty()
    }

    /// 按给定的 key 筛选表情，空列表表示全部；同时返回未注册的 key
    pub fn select(&self, keys: &[String]) -> (Vec<Arc<Meme>>, Vec<String>) {
        if keys.is_empty() {
            return (self.memes().cloned().collect(), Vec::new());
        }
        let unknown = keys
            .iter()
            .filter(|key| !self.memes.contains_key(key.as_str()))
            .cloned()
            .collect();
        let selected = self
            .memes()
            .filter(|meme| keys.contains(&meme.key))
            .cloned()
            .collect();
        (selected, unknown)
    }

    /// 每次调用都重新计算，不做缓存
    pub fn categories(&self) -> MemeCategories {
        let mut categories = MemeCategories::default();
        for meme in self.memes() {
            categories.all.push(meme.key.clone());
            match meme.params_type.category() {
                Some(MemeCategory::TextOnly) => categories.text_only.push(meme.key.clone()),
                Some(MemeCategory::ImageOnly) => categories.image_only.push(meme.key.clone()),
                Some(MemeCategory::Mixed) => categories.mixed.push(meme.key.clone()),
                None => {}
            }
        }
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::meme::MemeInput;

    fn noop(_: MemeInput<'_>) -> std::result::Result<Vec<u8>, MemeError> {
        Ok(Vec::new())
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = MemeRegistry::new(vec![
            Meme::builder("a", noop).build(),
            Meme::builder("a", noop).build(),
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_unknown_key() {
        let registry = MemeRegistry::builtin().unwrap();
        assert_eq!(
            registry.get("does_not_exist").unwrap_err(),
            MemeError::NoSuchMeme("does_not_exist".to_string())
        );
    }

    #[test]
    fn test_builtin_categories() {
        let categories = MemeRegistry::builtin().unwrap().categories();
        assert_eq!(categories.all.len(), 8);
        assert_eq!(categories.text_only, vec!["sign", "two_choices"]);
        assert_eq!(categories.image_only, vec!["mirror", "side_by_side", "spin"]);
        assert_eq!(categories.mixed, vec!["caption"]);
        // 无输入和文字可选的表情只出现在 all 中
        for key in ["confetti", "grayscale"] {
            assert!(categories.all.iter().any(|k| k == key));
            assert!(!categories.text_only.iter().any(|k| k == key));
            assert!(!categories.image_only.iter().any(|k| k == key));
            assert!(!categories.mixed.iter().any(|k| k == key));
        }
    }

    #[test]
    fn test_select_reports_unknown_keys() {
        let registry = MemeRegistry::builtin().unwrap();

        let (all, unknown) = registry.select(&[]);
        assert_eq!(all.len(), 8);
        assert!(unknown.is_empty());

        let keys = vec!["spin".to_string(), "nope".to_string(), "sign".to_string()];
        let (selected, unknown) = registry.select(&keys);
        let selected: Vec<&str> = selected.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(selected, ["sign", "spin"]);
        assert_eq!(unknown, ["nope"]);
    }

    #[test]
    fn test_keys_sorted() {
        let keys = MemeRegistry::builtin().unwrap().keys();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
