// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 负责任务的节流和串行执行
pub mod task_runner;
pub mod throttle;
