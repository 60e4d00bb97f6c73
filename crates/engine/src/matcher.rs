//! 规则匹配
//!
//! 给定公司与事件类型，返回应当触发的激活规则集合。
//! 空集是常态（大多数事件类型没有配置规则），不是错误，
//! 事件处理器据此廉价短路。

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::models::Rule;
use crate::store::GamifyStore;

/// 规则匹配器
///
/// 匹配顺序本身没有语义，但必须确定（按规则创建顺序），
/// 保证账本流水和测试断言可复现。顺序由存储契约保证。
pub struct RuleMatcher {
    store: Arc<dyn GamifyStore>,
}

impl RuleMatcher {
    pub fn new(store: Arc<dyn GamifyStore>) -> Self {
        Self { store }
    }

    /// 查询匹配的激活规则
    ///
    /// 同一事件类型的多条规则全部独立触发，由调用方逐条应用。
    pub async fn matching_rules(&self, company_id: &str, event_type: &str) -> Result<Vec<Rule>> {
        let rules = self.store.active_rules(company_id, event_type).await?;
        if rules.is_empty() {
            debug!(company_id, event_type, "无匹配规则");
        }
        Ok(rules)
    }
}
