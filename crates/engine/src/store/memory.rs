//! 内存存储实现
//!
//! 完整实现 `GamifyStore` 语义，供确定性测试和本地演示使用，
//! 不依赖外部服务。全部状态置于单把互斥锁之后，`apply_awards`
//! 在锁内完成整个读-改-写，天然满足单用户串行化要求。
//!
//! 与 Postgres 实现保持行为一致：惰性建公司/用户、徽章幂等发放、
//! 悬空徽章引用降级、创建顺序的稳定排序。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use async_trait::async_trait;

use crate::error::Result;
use crate::level;
use crate::models::{EarnedBadge, Rule, User};
use crate::store::{AwardBatch, AwardReceipt, GamifyStore, LeaderboardRow};

#[derive(Debug, Clone)]
struct MemUser {
    user: User,
    /// 创建序号，排行榜并列 XP 时的稳定次序键
    seq: u64,
}

#[derive(Debug, Clone)]
struct MemBadge {
    company_id: String,
    name: String,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Clone)]
struct MemGrant {
    user_id: String,
    badge_id: i64,
    earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct MemXpEvent {
    user_id: String,
    xp_amount: i64,
}

#[derive(Default)]
struct MemoryState {
    companies: HashMap<String, String>,
    users: HashMap<String, MemUser>,
    rules: Vec<Rule>,
    badges: HashMap<i64, MemBadge>,
    grants: Vec<MemGrant>,
    xp_events: Vec<MemXpEvent>,
    next_rule_id: i64,
    next_badge_id: i64,
    next_user_seq: u64,
}

/// 内存存储
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 配置预置（测试/演示数据） ====================

    /// 创建徽章定义，返回徽章 id
    pub fn add_badge(&self, company_id: &str, name: &str) -> i64 {
        let mut state = self.state.lock();
        state.next_badge_id += 1;
        let id = state.next_badge_id;
        state.companies.entry(company_id.to_string()).or_insert_with(|| company_id.to_string());
        state.badges.insert(
            id,
            MemBadge {
                company_id: company_id.to_string(),
                name: name.to_string(),
                description: None,
                icon: None,
            },
        );
        id
    }

    /// 创建激活规则，返回规则 id
    pub fn add_rule(
        &self,
        company_id: &str,
        event_type: &str,
        xp_amount: i64,
        badge_id: Option<i64>,
    ) -> i64 {
        let mut state = self.state.lock();
        state.next_rule_id += 1;
        let id = state.next_rule_id;
        state.companies.entry(company_id.to_string()).or_insert_with(|| company_id.to_string());
        // 徽章必须属于同一公司才投影名称，跨公司引用视同悬空
        let badge_name = badge_id.and_then(|bid| {
            state
                .badges
                .get(&bid)
                .filter(|b| b.company_id == company_id)
                .map(|b| b.name.clone())
        });
        state.rules.push(Rule {
            id,
            company_id: company_id.to_string(),
            event_type: event_type.to_string(),
            xp_amount,
            badge_id,
            badge_name,
            is_active: true,
            created_at: Utc::now(),
        });
        id
    }

    /// 停用规则（管理端带外操作的模拟）
    pub fn deactivate_rule(&self, rule_id: i64) {
        let mut state = self.state.lock();
        if let Some(rule) = state.rules.iter_mut().find(|r| r.id == rule_id) {
            rule.is_active = false;
        }
    }

    /// 删除徽章定义（制造悬空规则引用的测试场景）
    pub fn remove_badge(&self, badge_id: i64) {
        self.state.lock().badges.remove(&badge_id);
    }

    /// 设置用户展示名（用户不存在则惰性创建）
    pub fn set_display_name(&self, user_id: &str, company_id: &str, display_name: &str) {
        let mut state = self.state.lock();
        ensure_user(&mut state, user_id, company_id);
        if let Some(entry) = state.users.get_mut(user_id) {
            entry.user.display_name = Some(display_name.to_string());
        }
    }
}

/// 锁内的惰性建公司 + 建用户
fn ensure_user(state: &mut MemoryState, user_id: &str, company_id: &str) -> User {
    state.companies.entry(company_id.to_string()).or_insert_with(|| company_id.to_string());
    if !state.users.contains_key(user_id) {
        state.next_user_seq += 1;
        let now = Utc::now();
        state.users.insert(
            user_id.to_string(),
            MemUser {
                user: User {
                    id: user_id.to_string(),
                    company_id: company_id.to_string(),
                    display_name: None,
                    xp: 0,
                    level: 1,
                    created_at: now,
                    updated_at: now,
                },
                seq: state.next_user_seq,
            },
        );
    }
    state.users[user_id].user.clone()
}

#[async_trait]
impl GamifyStore for MemoryStore {
    async fn active_rules(&self, company_id: &str, event_type: &str) -> Result<Vec<Rule>> {
        let state = self.state.lock();
        // rules 按插入顺序存放，天然是创建顺序
        Ok(state
            .rules
            .iter()
            .filter(|r| r.is_active && r.company_id == company_id && r.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.state.lock().users.get(user_id).map(|m| m.user.clone()))
    }

    async fn get_or_create_user(&self, user_id: &str, company_id: &str) -> Result<User> {
        let mut state = self.state.lock();
        Ok(ensure_user(&mut state, user_id, company_id))
    }

    async fn apply_awards(&self, batch: &AwardBatch) -> Result<AwardReceipt> {
        // 整个读-改-写持有同一把锁，与 Postgres 行锁事务等价
        let mut state = self.state.lock();
        let user = ensure_user(&mut state, &batch.user_id, &batch.company_id);

        let mut total_xp = 0i64;
        let mut granted_badge_ids = Vec::new();

        for award in &batch.awards {
            state.xp_events.push(MemXpEvent {
                user_id: batch.user_id.clone(),
                xp_amount: award.xp_amount,
            });
            total_xp += award.xp_amount;

            let Some(badge_id) = award.badge_id else {
                continue;
            };

            if !state.badges.contains_key(&badge_id) {
                warn!(badge_id, rule_id = award.rule_id, "规则引用的徽章不存在，按无徽章处理");
                continue;
            }

            let already_earned = state
                .grants
                .iter()
                .any(|g| g.user_id == batch.user_id && g.badge_id == badge_id);
            if already_earned {
                debug!(badge_id, user_id = %batch.user_id, "用户已持有该徽章，幂等跳过");
                continue;
            }

            state.grants.push(MemGrant {
                user_id: batch.user_id.clone(),
                badge_id,
                earned_at: Utc::now(),
            });
            granted_badge_ids.push(badge_id);
        }

        let new_xp = user.xp + total_xp;
        let new_level = level::level_for_xp(new_xp);
        if let Some(entry) = state.users.get_mut(&batch.user_id) {
            entry.user.xp = new_xp;
            entry.user.level = new_level;
            entry.user.updated_at = Utc::now();
        }

        Ok(AwardReceipt {
            previous_level: user.level,
            new_xp,
            new_level,
            granted_badge_ids,
        })
    }

    async fn leaderboard_page(
        &self,
        company_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardRow>> {
        let state = self.state.lock();
        let mut members: Vec<&MemUser> = state
            .users
            .values()
            .filter(|m| m.user.company_id == company_id)
            .collect();
        members.sort_by(|a, b| b.user.xp.cmp(&a.user.xp).then(a.seq.cmp(&b.seq)));

        Ok(members
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|m| LeaderboardRow {
                user_id: m.user.id.clone(),
                display_name: m.user.display_name.clone(),
                xp: m.user.xp,
                level: m.user.level,
                badge_count: state
                    .grants
                    .iter()
                    .filter(|g| g.user_id == m.user.id)
                    .count() as i64,
            })
            .collect())
    }

    async fn rank_of(&self, user_id: &str, company_id: &str) -> Result<i64> {
        let state = self.state.lock();
        let xp = state.users.get(user_id).map(|m| m.user.xp).unwrap_or(0);
        let higher = state
            .users
            .values()
            .filter(|m| m.user.company_id == company_id && m.user.xp > xp)
            .count() as i64;
        Ok(higher + 1)
    }

    async fn ledger_total(&self, user_id: &str) -> Result<i64> {
        let state = self.state.lock();
        Ok(state
            .xp_events
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.xp_amount)
            .sum())
    }

    async fn user_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>> {
        let state = self.state.lock();
        let mut earned: Vec<EarnedBadge> = state
            .grants
            .iter()
            .filter(|g| g.user_id == user_id)
            .filter_map(|g| {
                state.badges.get(&g.badge_id).map(|b| EarnedBadge {
                    badge_id: g.badge_id,
                    name: b.name.clone(),
                    description: b.description.clone(),
                    icon: b.icon.clone(),
                    earned_at: g.earned_at,
                })
            })
            .collect();
        earned.sort_by(|a, b| b.earned_at.cmp(&a.earned_at).then(b.badge_id.cmp(&a.badge_id)));
        Ok(earned)
    }
}
