// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod browser;
pub mod chromium_extractor;
pub mod parsers;
pub mod session;
pub mod traits;
