//! TagRegistry - 宣言された tag の集合
//!
//! # 学習ポイント
//! - 静的な union (`FailureSet`) から実行時の集合を組み立てる
//! - 二重登録は設計ミスとしてエラーにする（Fail-fast 設計）

use std::collections::HashMap;

use crate::domain::{FailureSet, Tagged};

/// TagRegistry は境界で受け付ける failure tag を管理
///
/// # 使用例
/// ```ignore
/// let registry = TagRegistry::of::<Failures![FooError, BarError]>()?;
/// assert!(registry.contains("FooError"));
/// ```
///
/// # 内部実装
/// - tag → 宣言順の index を HashMap で管理
/// - `registered_tags()` は宣言順で返す
#[derive(Debug, Default, Clone)]
pub struct TagRegistry {
    order: Vec<&'static str>,
    index: HashMap<&'static str, usize>,
}

/// RegistryError は TagRegistry の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failure tag '{0}' is already registered")]
    DuplicateTag(String),
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from every tag declared by the union `F`.
    pub fn of<F: FailureSet>() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for tag in F::tags() {
            registry.insert(tag)?;
        }
        Ok(registry)
    }

    pub fn register<E: Tagged>(&mut self) -> Result<(), RegistryError> {
        self.insert(E::TAG)
    }

    fn insert(&mut self, tag: &'static str) -> Result<(), RegistryError> {
        if self.index.contains_key(tag) {
            return Err(RegistryError::DuplicateTag(tag.to_string()));
        }
        self.index.insert(tag, self.order.len());
        self.order.push(tag);
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    /// Declaration index of `tag`.
    pub fn position(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    pub fn registered_tags(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
