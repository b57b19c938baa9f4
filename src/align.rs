// ============================================
// src/align.rs
// 候補の解決とマスク位置の整合チェック（検査の中核）
// ============================================

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::catalog::DictionaryEntry;
use crate::error::{Result, YomiwizError};
use crate::record::QuestionRecord;

/// 熟字訓（読みが1文字ずつに分解できない単語）の一覧
///
/// 検証ロジックから独立した設定テーブル。単語を足すときは
/// ここ（またはJSONファイル）だけ触ればよい
#[derive(Debug, Clone)]
pub struct IrregularWordRegistry {
    words: BTreeMap<String, String>,
}

impl Default for IrregularWordRegistry {
    /// 元データに現れる代表的な熟字訓
    fn default() -> Self {
        Self::from_pairs([
            ("明日", "あした"),
            ("大人", "おとな"),
            ("七夕", "たなばた"),
            ("梅雨", "つゆ"),
            ("五月雨", "さみだれ"),
            ("二十日", "はつか"),
            ("今日", "きょう"),
            ("今年", "ことし"),
        ])
    }
}

impl IrregularWordRegistry {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            words: pairs
                .into_iter()
                .map(|(w, r)| (w.to_string(), r.to_string()))
                .collect(),
        }
    }

    /// JSON ファイル（単語 → 読み のマップ）から読み込む
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let words: BTreeMap<String, String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| YomiwizError::MalformedRegistry {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { words })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }
}

/// 答えと読みの位置整合チェックの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 裏付けになる候補が1つも無い。データ不備の証拠にはならないので許容
    NoMatch,
    /// 整合している
    Aligned,
    /// 位置が合わない
    Misaligned(Misalignment),
    /// 既知の熟字訓に当たった
    KnownIrregular { word: String },
}

/// Misaligned の内訳
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misalignment {
    pub word: String,
    pub reading: String,
    pub reason: MisalignReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisalignReason {
    /// 答えが単語の先頭なのにマスクが読みの先頭でない
    FirstCharButMaskNotAtStart,
    /// 答えが単語の末尾なのにマスクが読みの末尾でない
    LastCharButMaskNotAtEnd,
    /// (--strict-medial) 中間の文字なのにマスクが読みの端に掛かっている
    MedialButMaskAtEdge,
}

/// 答えを含む単語、かつマスクを含む読みのエントリだけを残す
///
/// 手掛かりがマスク1つしか無いため条件はあえて緩い。
/// 誤検出の排除は validate 側の仕事。並び順はエントリ列の挿入順のまま
pub fn candidates<'a>(
    answer: &str,
    mask: &str,
    entries: impl IntoIterator<Item = &'a DictionaryEntry>,
) -> impl Iterator<Item = &'a DictionaryEntry> {
    let answer = answer.to_owned();
    let mask = mask.to_owned();
    entries
        .into_iter()
        .filter(move |e| e.word.contains(&answer) && e.reading.contains(&mask))
}

/// needle が最初に現れる位置を文字数で返す（バイト位置ではない）
fn char_index_of(haystack: &str, needle: &str) -> Option<usize> {
    let byte_idx = haystack.find(needle)?;
    Some(haystack[..byte_idx].chars().count())
}

/// 候補を解決順に調べ、最初に確定した判定を返す
///
/// 問題データは実質1問につき1つの語義しか持たないので、
/// 先勝ちが再現可能なタイブレークになる。候補ゼロは NoMatch
pub fn validate<'a>(
    record: &QuestionRecord,
    candidates: impl IntoIterator<Item = &'a DictionaryEntry>,
    registry: &IrregularWordRegistry,
    strict_medial: bool,
) -> Verdict {
    let Some(span) = &record.mask else {
        return Verdict::NoMatch;
    };
    for entry in candidates {
        if let Some(verdict) =
            validate_candidate(&record.answer, &span.mask, entry, registry, strict_medial)
        {
            return verdict;
        }
    }
    Verdict::NoMatch
}

/// 1候補の位置整合チェック
fn validate_candidate(
    answer: &str,
    mask: &str,
    entry: &DictionaryEntry,
    registry: &IrregularWordRegistry,
    strict_medial: bool,
) -> Option<Verdict> {
    // 熟字訓はそもそも位置が合わないので、計算より先に確定させる
    if registry.contains(&entry.word) {
        return Some(Verdict::KnownIrregular {
            word: entry.word.clone(),
        });
    }

    let word_chars = entry.word.chars().count();
    let reading_chars = entry.reading.chars().count();
    let kanji_idx = char_index_of(&entry.word, answer)?;
    let mask_idx = char_index_of(&entry.reading, mask)?;
    let mask_end = mask_idx + mask.chars().count();

    let misaligned = |reason| {
        Some(Verdict::Misaligned(Misalignment {
            word: entry.word.clone(),
            reading: entry.reading.clone(),
            reason,
        }))
    };

    // 先頭の文字なら、マスクも読みの先頭から始まるはず
    if kanji_idx == 0 && mask_idx != 0 {
        return misaligned(MisalignReason::FirstCharButMaskNotAtStart);
    }
    // 末尾の文字なら、マスクも読みの末尾で終わるはず
    if kanji_idx == word_chars - 1 && mask_end != reading_chars {
        return misaligned(MisalignReason::LastCharButMaskNotAtEnd);
    }
    // 中間の文字には既定では位置の制約を掛けない（隣接モデルが無いため）。
    // --strict-medial のときだけ、マスクが読みの内側にあることを要求する
    if strict_medial
        && kanji_idx > 0
        && kanji_idx < word_chars - 1
        && (mask_idx == 0 || mask_end == reading_chars)
    {
        return misaligned(MisalignReason::MedialButMaskAtEdge);
    }

    Some(Verdict::Aligned)
}

// --------------------------------------------------
// テスト
// --------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MaskSpan;

    fn entry(word: &str, reading: &str) -> DictionaryEntry {
        DictionaryEntry {
            word: word.to_string(),
            reading: reading.to_string(),
        }
    }

    fn record(answer: &str, mask: &str) -> QuestionRecord {
        QuestionRecord {
            question: format!("[{mask}]"),
            answer: answer.to_string(),
            mask: Some(MaskSpan {
                prefix: String::new(),
                mask: mask.to_string(),
                suffix: String::new(),
            }),
        }
    }

    fn check(answer: &str, mask: &str, entries: &[DictionaryEntry]) -> Verdict {
        let rec = record(answer, mask);
        let cands = candidates(answer, mask, entries.iter());
        validate(&rec, cands, &IrregularWordRegistry::default(), false)
    }

    #[test]
    fn candidates_require_both_containments() {
        let entries = vec![
            entry("図書館", "としょかん"),
            entry("図画", "ずが"),
            entry("水族館", "すいぞくかん"),
        ];
        let found: Vec<&str> = candidates("図", "と", entries.iter())
            .map(|e| e.word.as_str())
            .collect();
        assert_eq!(found, ["図書館"]);
    }

    #[test]
    fn candidate_order_follows_entry_order() {
        let entries = vec![entry("学校", "がっこう"), entry("学年", "がくねん")];
        let found: Vec<&str> = candidates("学", "が", entries.iter())
            .map(|e| e.word.as_str())
            .collect();
        assert_eq!(found, ["学校", "学年"]);
    }

    #[test]
    fn first_char_with_mask_at_start_is_aligned() {
        // 図書館/としょかん で 図 と「と」→ 両方とも先頭
        let entries = vec![entry("図書館", "としょかん")];
        assert_eq!(check("図", "と", &entries), Verdict::Aligned);
    }

    #[test]
    fn first_char_with_mask_inside_is_misaligned() {
        // 図 は先頭なのにマスク「しょ」は読みの途中から
        let entries = vec![entry("図書館", "としょかん")];
        let Verdict::Misaligned(m) = check("図", "しょ", &entries) else {
            panic!("expected misaligned");
        };
        assert_eq!(m.reason, MisalignReason::FirstCharButMaskNotAtStart);
        assert_eq!(m.word, "図書館");
    }

    #[test]
    fn last_char_with_short_mask_is_misaligned() {
        // 1文字の単語は先頭かつ末尾。マスク「か」は「かん」の末尾に届かない
        let entries = vec![entry("館", "かん")];
        let Verdict::Misaligned(m) = check("館", "か", &entries) else {
            panic!("expected misaligned");
        };
        assert_eq!(m.reason, MisalignReason::LastCharButMaskNotAtEnd);
    }

    #[test]
    fn last_char_with_mask_at_end_is_aligned() {
        let entries = vec![entry("図書館", "としょかん")];
        assert_eq!(check("館", "かん", &entries), Verdict::Aligned);
    }

    #[test]
    fn jukujikun_word_wins_over_alignment_math() {
        // 明日/あした は位置計算の結果に関わらず熟字訓として確定する
        let entries = vec![entry("明日", "あした")];
        assert_eq!(
            check("明", "あ", &entries),
            Verdict::KnownIrregular {
                word: "明日".to_string()
            }
        );
    }

    #[test]
    fn medial_char_has_no_position_check_by_default() {
        // 書 は中間文字。マスクが読みの先頭でも既定では通る（既知の検査漏れ）
        let entries = vec![entry("図書館", "としょかん")];
        assert_eq!(check("書", "と", &entries), Verdict::Aligned);
    }

    #[test]
    fn strict_medial_rejects_mask_at_reading_edge() {
        let entries = vec![entry("図書館", "としょかん")];
        let rec = record("書", "と");
        let cands = candidates("書", "と", entries.iter());
        let verdict = validate(&rec, cands, &IrregularWordRegistry::default(), true);
        let Verdict::Misaligned(m) = verdict else {
            panic!("expected misaligned");
        };
        assert_eq!(m.reason, MisalignReason::MedialButMaskAtEdge);

        // 内側のマスクは strict でも通る
        let rec = record("書", "しょ");
        let cands = candidates("書", "しょ", &entries);
        assert_eq!(
            validate(&rec, cands, &IrregularWordRegistry::default(), true),
            Verdict::Aligned
        );
    }

    #[test]
    fn no_candidates_is_nomatch() {
        let entries = vec![entry("図書館", "としょかん")];
        assert_eq!(check("犬", "いぬ", &entries), Verdict::NoMatch);
    }

    #[test]
    fn missing_mask_is_nomatch() {
        let entries = vec![entry("図書館", "としょかん")];
        let rec = QuestionRecord {
            question: "としょかん".to_string(),
            answer: "図".to_string(),
            mask: None,
        };
        let cands = candidates("図", "と", entries.iter());
        assert_eq!(
            validate(&rec, cands, &IrregularWordRegistry::default(), false),
            Verdict::NoMatch
        );
    }

    #[test]
    fn first_candidate_verdict_wins() {
        // 最初の候補（位置不整合）で確定し、2番目の整合候補は見ない
        let entries = vec![entry("入学", "にゅうがく"), entry("学校", "がっこう")];
        let rec = record("学", "が");
        let cands = candidates("学", "が", entries.iter());
        let verdict = validate(&rec, cands, &IrregularWordRegistry::default(), false);
        let Verdict::Misaligned(m) = verdict else {
            panic!("expected misaligned");
        };
        // 入学 では 学 が末尾なのにマスクが読みの末尾に届かない
        assert_eq!(m.word, "入学");
        assert_eq!(m.reason, MisalignReason::LastCharButMaskNotAtEnd);
    }

    #[test]
    fn registry_is_injectable() {
        let registry = IrregularWordRegistry::from_pairs([("時雨", "しぐれ")]);
        let entries = vec![entry("時雨", "しぐれ")];
        let rec = record("時", "し");
        let cands = candidates("時", "し", entries.iter());
        assert_eq!(
            validate(&rec, cands, &registry, false),
            Verdict::KnownIrregular {
                word: "時雨".to_string()
            }
        );
    }
}
