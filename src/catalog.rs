// ============================================
// src/catalog.rs
// 学年別問題集 (grade{N}.json) の読み込みモジュール
// ============================================

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, YomiwizError};

/// 問題集の questions 欄にある単語・読みのペア
///
/// `reading` は `word` 全体の読みであって、1文字ずつの対応は保証されない
/// （熟字訓はそもそも分解できない）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub reading: String,
}

/// grade{N}.json のファイル構造
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GradeFile {
    #[serde(default)]
    kanji_list: Vec<String>,
    #[serde(default)]
    word_categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    questions: Vec<DictionaryEntry>,
}

/// 1学年ぶんの正解データ。読み込み後は不変
#[derive(Debug, Default)]
pub struct GradeCatalog {
    pub grade: u32,
    /// この学年で出題してよい漢字の集合
    pub allowed_kanji: HashSet<char>,
    /// 単語・読みのペア（ファイル内の並び順を保持する）
    pub entries: Vec<DictionaryEntry>,
}

/// 文字列がちょうど1文字ならその文字を返す
fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl GradeCatalog {
    /// grade{N}.json を読み込む
    ///
    /// ファイルが無い学年は空のカタログを返す。呼び出し側は
    /// 「この学年の検査はスキップ」として扱うこと（エラーではない）
    pub fn load(catalog_dir: &Path, grade: u32) -> Result<Self> {
        let path = catalog_dir.join(format!("grade{grade}.json"));
        if !path.exists() {
            return Ok(Self {
                grade,
                ..Self::default()
            });
        }

        let file = File::open(&path)?;
        let data: GradeFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| YomiwizError::MalformedCatalog {
                path: path.clone(),
                source,
            })?;

        // 許可漢字は kanjiList と wordCategories の1文字エントリの和集合
        let mut allowed_kanji = HashSet::new();
        for item in &data.kanji_list {
            if let Some(c) = single_char(item) {
                allowed_kanji.insert(c);
            }
        }
        for list in data.word_categories.values() {
            for item in list {
                if let Some(c) = single_char(item) {
                    allowed_kanji.insert(c);
                }
            }
        }

        Ok(Self {
            grade,
            allowed_kanji,
            entries: data.questions,
        })
    }

    /// 許可漢字リストが取れなかったか（ファイル欠落など）
    pub fn is_empty(&self) -> bool {
        self.allowed_kanji.is_empty()
    }
}

/// 全学年のカタログをまとめたもの
///
/// 学年をまたいだ候補解決（3年生の単語で5年生の問題を裏付ける等）に使う
#[derive(Debug, Default)]
pub struct CatalogSet {
    catalogs: BTreeMap<u32, GradeCatalog>,
}

impl CatalogSet {
    /// 指定範囲の学年をまとめて読み込む
    ///
    /// 壊れた JSON はその学年だけエラーに積み、他の学年は読み込みを続ける
    pub fn load_all(catalog_dir: &Path, grades: RangeInclusive<u32>) -> (Self, Vec<YomiwizError>) {
        let mut catalogs = BTreeMap::new();
        let mut errors = Vec::new();
        for grade in grades {
            match GradeCatalog::load(catalog_dir, grade) {
                Ok(catalog) => {
                    catalogs.insert(grade, catalog);
                }
                Err(err) => errors.push(err),
            }
        }
        (Self { catalogs }, errors)
    }

    pub fn get(&self, grade: u32) -> Option<&GradeCatalog> {
        self.catalogs.get(&grade)
    }

    /// 候補解決に使う辞書エントリの列
    ///
    /// 自学年のエントリを先頭に、残りを学年昇順で続ける。
    /// この並びが解決順（＝先勝ちのタイブレーク順）になる
    pub fn resolution_entries(&self, grade: u32) -> Vec<&DictionaryEntry> {
        let mut out = Vec::new();
        if let Some(catalog) = self.catalogs.get(&grade) {
            out.extend(catalog.entries.iter());
        }
        for (g, catalog) in &self.catalogs {
            if *g != grade {
                out.extend(catalog.entries.iter());
            }
        }
        out
    }
}

// --------------------------------------------------
// テスト
// --------------------------------------------------
