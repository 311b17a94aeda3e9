use serde_json::Value;

use super::cache::{EntityCache, ResourceKind};

/// 下拉选项：value 为实体 id，label 为展示文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// 派生选项集，没有独立状态，只能由缓存整体重建
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSets {
    pub user_options: Vec<SelectOption>,
    pub product_options: Vec<SelectOption>,
}

/// 纯函数：由当前缓存内容重建选项集，保持缓存顺序
pub fn build_option_sets(cache: &EntityCache) -> OptionSets {
    let user_options = cache
        .snapshot(ResourceKind::Users)
        .iter()
        .map(user_option)
        .collect();
    let product_options = cache
        .snapshot(ResourceKind::Products)
        .iter()
        .map(product_option)
        .collect();

    OptionSets {
        user_options,
        product_options,
    }
}

fn user_option(entity: &Value) -> SelectOption {
    SelectOption {
        value: field_text(entity, "id"),
        label: format!(
            "{} {} ({})",
            field_text(entity, "firstName"),
            field_text(entity, "lastName"),
            field_text(entity, "username"),
        ),
    }
}

fn product_option(entity: &Value) -> SelectOption {
    SelectOption {
        value: field_text(entity, "id"),
        label: format!(
            "{} - ${}",
            field_text(entity, "name"),
            field_text(entity, "price"),
        ),
    }
}

// 实体字段按契约不透明，取文本时数字原样渲染、缺失为空串
fn field_text(entity: &Value, key: &str) -> String {
    match entity.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}
