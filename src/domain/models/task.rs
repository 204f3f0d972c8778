// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 默认回溯天数，仅对 *_posts 类型有意义
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// 任务类型枚举
///
/// 每种类型对应抓取协作者的一个操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 个人主页
    Profile,
    /// 个人动态
    ProfilePosts,
    /// 公司主页
    Company,
    /// 公司动态
    CompanyPosts,
    /// 公司职位列表
    JobsCompany,
}

impl TaskKind {
    /// 是否使用回溯窗口过滤结果
    pub fn has_lookback(&self) -> bool {
        matches!(self, TaskKind::ProfilePosts | TaskKind::CompanyPosts)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Profile => "profile",
            TaskKind::ProfilePosts => "profile_posts",
            TaskKind::Company => "company",
            TaskKind::CompanyPosts => "company_posts",
            TaskKind::JobsCompany => "jobs_company",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 任务解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskParseError {
    /// 未知任务类型
    #[error("unknown_type")]
    UnknownType(String),
    /// 缺少目标地址
    #[error("Missing url")]
    MissingUrl,
}

impl FromStr for TaskKind {
    type Err = TaskParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(TaskKind::Profile),
            "profile_posts" => Ok(TaskKind::ProfilePosts),
            "company" => Ok(TaskKind::Company),
            "company_posts" => Ok(TaskKind::CompanyPosts),
            "jobs_company" => Ok(TaskKind::JobsCompany),
            other => Err(TaskParseError::UnknownType(other.to_string())),
        }
    }
}

/// 任务描述符
///
/// 由请求参数构造，创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    kind: TaskKind,
    url: String,
    lookback_days: i64,
    use_session: bool,
}

impl TaskDescriptor {
    pub fn new(kind: TaskKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            use_session: false,
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_session(mut self, use_session: bool) -> Self {
        self.use_session = use_session;
        self
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn lookback_days(&self) -> i64 {
        self.lookback_days
    }

    pub fn use_session(&self) -> bool {
        self.use_session
    }
}

/// 队列条目
///
/// 解析失败的条目保留原始类型名和地址，由任务执行器在本地生成失败信封。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEntry {
    Task(TaskDescriptor),
    Rejected {
        type_name: String,
        url: String,
        reason: TaskParseError,
    },
}

/// 登录标志
///
/// 兼容 `true`/`false`、`0`/`1` 和 `"0"`/`"1"` 三种写法
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LoginFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl LoginFlag {
    pub fn enabled(&self) -> bool {
        match self {
            LoginFlag::Bool(b) => *b,
            LoginFlag::Number(n) => *n != 0,
            LoginFlag::Text(s) => parse_login_flag(s),
        }
    }
}

/// 解析查询参数中的 login 标志
pub fn parse_login_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// 队列中单个任务的请求体
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskRequestDto {
    /// 任务类型
    #[serde(rename = "type", default)]
    pub task_type: String,
    /// 目标地址
    #[serde(default)]
    pub url: String,
    /// 回溯天数
    pub days: Option<i64>,
    /// 是否走登录流程
    pub login: Option<LoginFlag>,
}

impl TaskRequestDto {
    /// 转换为队列条目
    pub fn into_entry(self) -> QueueEntry {
        let kind = match self.task_type.parse::<TaskKind>() {
            Ok(kind) => kind,
            Err(reason) => {
                return QueueEntry::Rejected {
                    type_name: self.task_type,
                    url: self.url,
                    reason,
                }
            }
        };

        let url = self.url.trim();
        if url.is_empty() {
            return QueueEntry::Rejected {
                type_name: self.task_type,
                url: self.url,
                reason: TaskParseError::MissingUrl,
            };
        }

        let descriptor = TaskDescriptor::new(kind, url)
            .with_lookback_days(self.days.unwrap_or(DEFAULT_LOOKBACK_DAYS))
            .with_session(self.login.as_ref().is_some_and(LoginFlag::enabled));
        QueueEntry::Task(descriptor)
    }
}

/// 队列请求体
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueRequestDto {
    /// 是否以 NDJSON 流式返回
    #[serde(default = "default_stream")]
    pub stream: bool,
    /// 按顺序执行的任务
    #[serde(default)]
    pub tasks: Vec<TaskRequestDto>,
}

fn default_stream() -> bool {
    true
}
