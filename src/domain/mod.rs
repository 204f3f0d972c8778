// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：任务描述、结果信封和各类记录
/// - 仓库接口（repositories）：会话存储抽象
/// - 服务（services）：与外部无关的业务规则
pub mod models;
pub mod repositories;
pub mod services;
