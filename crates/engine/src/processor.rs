//! 事件处理编排
//!
//! 引擎对传输层暴露的唯一写入口：一个事件进来，匹配规则，
//! 委托账本写入，返回结果摘要。传输层可以 fire-and-forget 地
//! 调度本方法（不等待结果），原子性与调度方式无关。

use std::sync::Arc;

use tracing::{debug, instrument};

use engageforge_shared::events::ActivityEvent;

use crate::error::Result;
use crate::ledger::LedgerWriter;
use crate::matcher::RuleMatcher;
use crate::models::ProcessOutcome;
use crate::store::GamifyStore;

/// 事件处理器
pub struct EventProcessor {
    matcher: RuleMatcher,
    writer: LedgerWriter,
}

impl EventProcessor {
    pub fn new(store: Arc<dyn GamifyStore>) -> Self {
        Self {
            matcher: RuleMatcher::new(store.clone()),
            writer: LedgerWriter::new(store),
        }
    }

    /// 处理一个活动事件
    ///
    /// 跳过场景统一返回零结果而非错误：
    /// - 事件不携带 `user_id`（系统级事件的常态）
    /// - 公司内没有匹配的激活规则
    ///
    /// 存储故障则整个事件失败且无部分写入，错误可重试，
    /// 重试与否由调用方决定——引擎内部不重试。
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process(&self, event: &ActivityEvent, company_id: &str) -> Result<ProcessOutcome> {
        let Some(user_id) = event.user_id() else {
            debug!("事件不携带 user_id，跳过");
            return Ok(ProcessOutcome::skipped());
        };

        let rules = self
            .matcher
            .matching_rules(company_id, &event.event_type)
            .await?;
        if rules.is_empty() {
            return Ok(ProcessOutcome::skipped());
        }

        self.writer
            .apply(user_id, company_id, &rules, &event.data)
            .await
    }
}
