// ==========================================
// 公寓运营后台 - 领域类型定义
// ==========================================
// 职责: 导入会话状态、校验问题级别
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入会话状态 (Session State)
// ==========================================
// 严格前进: Idle → Parsed → Validated → Importing → Completed
// 唯一的回退路径是 reset → Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Idle,      // 未加载文件
    Parsed,    // 已解析
    Validated, // 已校验（不代表无错误）
    Importing, // 导入中
    Completed, // 已完成（不可变）
}

impl SessionState {
    /// 判断是否允许从当前状态前进到 `next`
    ///
    /// reset 不经过此判断（任何状态都可回到 Idle）
    pub fn can_advance_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Idle, SessionState::Parsed)
                | (SessionState::Parsed, SessionState::Validated)
                | (SessionState::Validated, SessionState::Importing)
                | (SessionState::Importing, SessionState::Completed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "IDLE"),
            SessionState::Parsed => write!(f, "PARSED"),
            SessionState::Validated => write!(f, "VALIDATED"),
            SessionState::Importing => write!(f, "IMPORTING"),
            SessionState::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==========================================
// 校验问题级别 (Issue Level)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueLevel {
    Error,   // 错误（阻断该行导入）
    Warning, // 警告（仅提示）
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueLevel::Error => write!(f, "ERROR"),
            IssueLevel::Warning => write!(f, "WARNING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        assert!(SessionState::Idle.can_advance_to(SessionState::Parsed));
        assert!(SessionState::Parsed.can_advance_to(SessionState::Validated));
        assert!(SessionState::Validated.can_advance_to(SessionState::Importing));
        assert!(SessionState::Importing.can_advance_to(SessionState::Completed));

        assert!(!SessionState::Idle.can_advance_to(SessionState::Importing));
        assert!(!SessionState::Completed.can_advance_to(SessionState::Importing));
        assert!(!SessionState::Validated.can_advance_to(SessionState::Parsed));
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&SessionState::Validated).unwrap();
        assert_eq!(json, "\"VALIDATED\"");
        assert_eq!(SessionState::Importing.to_string(), "IMPORTING");
    }
}
