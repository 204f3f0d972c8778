// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 任务描述、结果信封、记录类型和会话存储接口
pub mod domain;

/// 引擎模块
///
/// 浏览器会话、登录流程、页面解析和抓取协作者
pub mod engines;

/// 基础设施模块
///
/// 会话存储的具体实现
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
///
/// 节流器和串行任务执行器
pub mod queue;

/// 工具模块
pub mod utils;
