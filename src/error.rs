// ============================================
// src/error.rs
// クレート共通のエラー型
// ============================================

use std::path::PathBuf;

use thiserror::Error;

/// yomiwiz の全操作で使うエラー型
#[derive(Debug, Error)]
pub enum YomiwizError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 問題集 JSON が壊れている（該当学年だけ中断し、他学年は続行する）
    #[error("Malformed catalog {}: {source}", path.display())]
    MalformedCatalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 熟字訓リスト JSON が壊れている
    #[error("Malformed jukujikun list {}: {source}", path.display())]
    MalformedRegistry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 確認プロンプトの失敗
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

pub type Result<T> = std::result::Result<T, YomiwizError>;
