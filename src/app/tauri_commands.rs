// ==========================================
// BOM 矩阵管理系统 - Tauri 命令（按域拆分）
// ==========================================
// 职责: Tauri 命令定义,连接前端与后端 API
// 约定: 成功返回 JSON 字符串；失败返回 {code, message, details} JSON 字符串
// ==========================================

#![cfg(feature = "tauri-app")]

mod bom;
mod common;
mod config;
mod import;
mod matrix;

pub use bom::*;
pub use config::*;
pub use import::*;
pub use matrix::*;
