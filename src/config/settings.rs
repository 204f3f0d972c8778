// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、节流、浏览器、登录凭据、会话存储和目标站点等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 节流配置
    pub throttle: ThrottleSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 登录凭据
    #[serde(default)]
    pub credentials: CredentialSettings,
    /// 会话存储配置
    pub session: SessionSettings,
    /// 目标站点配置
    pub site: SiteSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 节流配置设置
///
/// 两次抓取操作开始之间的随机间隔范围（毫秒）
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleSettings {
    /// 最小间隔
    pub min_ms: u64,
    /// 最大间隔
    pub max_ms: u64,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 自定义 User-Agent
    pub user_agent: Option<String>,
    /// 是否无头模式运行
    pub headless: bool,
    /// 单次导航超时时间（秒）
    pub navigation_timeout_secs: u64,
    /// 页面加载后的固定等待时间（毫秒）
    pub settle_ms: u64,
    /// Chrome 可执行文件路径
    pub executable: Option<String>,
    /// 上游代理
    #[serde(default)]
    pub proxy: ProxySettings,
}

/// 代理配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxySettings {
    /// 代理地址，例如 http://proxy.local:8080
    pub url: Option<String>,
    /// 代理用户名
    pub username: Option<String>,
    /// 代理密码
    pub password: Option<String>,
}

/// 登录凭据设置
///
/// 未配置时禁用交互式登录流程
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialSettings {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// 会话存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// 会话 Cookie 的存储键
    pub key: String,
    /// 会话文件所在目录
    pub dir: String,
}

/// 目标站点配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    /// 站点根地址
    pub base_url: String,
    /// 登录页路径
    pub login_path: String,
}

impl SiteSettings {
    /// 登录页完整地址
    pub fn login_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.login_path.trim_start_matches('/')
        )
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件和环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SCRAPEGATE").separator("__"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.throttle.normalize();
        Ok(settings)
    }

    /// 仅使用内置默认值构建配置，不读取文件和环境变量
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::defaults(Config::builder())?.build()?.try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            // Server
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Throttle
            .set_default("throttle.min_ms", 1200)?
            .set_default("throttle.max_ms", 2500)?
            // Browser
            .set_default("browser.headless", true)?
            .set_default("browser.navigation_timeout_secs", 45)?
            .set_default("browser.settle_ms", 1500)?
            // Session store
            .set_default("session.key", "default")?
            .set_default("session.dir", "./sessions")?
            // Target site
            .set_default("site.base_url", "https://www.linkedin.com")?
            .set_default("site.login_path", "/login")
    }
}

impl ThrottleSettings {
    /// 保证 min_ms <= max_ms
    pub fn normalize(&mut self) {
        if self.min_ms > self.max_ms {
            std::mem::swap(&mut self.min_ms, &mut self.max_ms);
        }
    }
}

impl CredentialSettings {
    /// 用户名和密码同时存在时才返回凭据对
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}
