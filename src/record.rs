// ============================================
// src/record.rs
// コーパス1行のパース（問題文・答え・マスク）
// ============================================

use std::sync::LazyLock;

use regex::Regex;

/// コメント行の先頭マーカー
pub const COMMENT_MARKER: char = '#';

// [ ] がちょうど1組で、マスクが空でないことまでここで保証する
static MASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\[\]]*)\[([^\[\]]+)\]([^\[\]]*)$").unwrap());

/// 問題文を [マスク] で分割した3要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSpan {
    pub prefix: String,
    /// 括弧内の読み（空でない）
    pub mask: String,
    pub suffix: String,
}

/// データ行としてパースできた1問
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    /// 問題文（[マスク] を含む元の文字列）
    pub question: String,
    /// 期待される答え（前後の空白を除去済み）
    pub answer: String,
    /// [マスク] がちょうど1つ取れた場合のみ Some。
    /// None の行は位置整合チェックの対象外（学年範囲チェックは受ける）
    pub mask: Option<MaskSpan>,
}

/// コーパス1行の分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// 空行（そのまま保持）
    Blank,
    /// コメント行（そのまま保持）
    Comment,
    /// カンマ区切りが2項目未満の行（検査対象外、そのまま保持）
    Passthrough,
    /// 検査対象のデータ行
    Record(QuestionRecord),
}

/// コーパスの1行をパースする
///
/// 空行・コメント行・項目不足の行は検査にも削除にも掛けない。
/// データ行は先頭項目を問題文、2番目（trim 済み）を答えとして読む
pub fn parse_line(line: &str) -> ParsedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParsedLine::Blank;
    }
    if trimmed.starts_with(COMMENT_MARKER) {
        return ParsedLine::Comment;
    }

    let mut parts = trimmed.split(',');
    let question = match parts.next() {
        Some(q) => q,
        None => return ParsedLine::Passthrough,
    };
    let answer = match parts.next() {
        Some(a) => a.trim(),
        None => return ParsedLine::Passthrough,
    };

    let mask = MASK_RE.captures(question).map(|caps| MaskSpan {
        prefix: caps[1].to_string(),
        mask: caps[2].to_string(),
        suffix: caps[3].to_string(),
    });

    ParsedLine::Record(QuestionRecord {
        question: question.to_string(),
        answer: answer.to_string(),
        mask,
    })
}

// --------------------------------------------------
// テスト
// --------------------------------------------------
