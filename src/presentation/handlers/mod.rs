// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// - 单任务接口（scrape_handler）：每个任务类型一个 GET 端点
/// - 队列接口（queue_handler）：批量任务，支持 NDJSON 流式输出
pub mod queue_handler;
pub mod scrape_handler;
