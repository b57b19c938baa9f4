// ============================================
// src/audit.rs
// コーパス全体の検査 (audit) と修復 (fix)
// ============================================

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;

use crate::align::{self, IrregularWordRegistry, MisalignReason, Misalignment, Verdict};
use crate::catalog::{CatalogSet, DictionaryEntry};
use crate::error::Result;
use crate::record::{self, ParsedLine, QuestionRecord};

// コーパスファイル名から学年を取り出す
static GRADE_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^grade(\d+)\.csv$").unwrap());

/// 検出した指摘の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// 答えがその学年の許可漢字に入っていない
    OutOfGrade,
    /// マスクと答えの位置が合わない（削除は人間の判断に委ねる）
    MaskAlignment,
    /// 既知の熟字訓に基づく出題
    PotentialIrregular,
}

impl IssueKind {
    pub fn label(self) -> &'static str {
        match self {
            IssueKind::OutOfGrade => "Out-of-Grade",
            IssueKind::MaskAlignment => "Mask Alignment",
            IssueKind::PotentialIrregular => "Potential Jukujikun",
        }
    }
}

/// 1件の指摘。発生箇所 (file:line) と説明文を持つ
#[derive(Debug, Clone)]
pub struct Issue {
    pub kind: IssueKind,
    /// コーパスファイル名（ディレクトリを除いた部分）
    pub file: String,
    /// 1始まりの行番号
    pub line: usize,
    pub details: String,
}

/// audit / fix 共通の設定
pub struct AuditOptions {
    /// コーパス (grade{N}.csv) のディレクトリ
    pub data_dir: PathBuf,
    /// 問題集 (grade{N}.json) のディレクトリ
    pub catalog_dir: PathBuf,
    pub min_grade: u32,
    pub max_grade: u32,
    /// 中間文字にもマスク位置の検査を掛けるか（既定 false）
    pub strict_medial: bool,
    pub registry: IrregularWordRegistry,
}

/// audit モードの結果
#[derive(Debug, Default)]
pub struct AuditReport {
    /// ファイル順・行順に並んだ指摘
    pub issues: Vec<Issue>,
}

impl AuditReport {
    /// 位置不整合（要・人間の判断）の件数
    pub fn misaligned_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.kind == IssueKind::MaskAlignment)
            .count()
    }
}

/// fix モードの結果
#[derive(Debug, Default)]
pub struct FixReport {
    pub total_removed: usize,
    /// ファイルごとの削除行数（削除があったファイルのみ）
    pub removed_per_file: Vec<(String, usize)>,
    /// 報告のみで削除しなかった位置不整合
    pub misaligned: Vec<Issue>,
}

/// data_dir の grade{N}.csv を学年昇順で列挙する
fn corpus_files(opts: &AuditOptions) -> Result<Vec<(u32, PathBuf)>> {
    let mut files = Vec::new();
    for dir_entry in fs::read_dir(&opts.data_dir)? {
        let dir_entry = dir_entry?;
        let name = dir_entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(caps) = GRADE_FILE_RE.captures(name) else {
            continue;
        };
        let Ok(grade) = caps[1].parse::<u32>() else {
            continue;
        };
        if (opts.min_grade..=opts.max_grade).contains(&grade) {
            files.push((grade, dir_entry.path()));
        }
    }
    files.sort_by_key(|(grade, _)| *grade);
    Ok(files)
}

/// 答えがちょうど1文字で、許可集合に入っているか
fn is_allowed(answer: &str, allowed: &HashSet<char>) -> bool {
    let mut chars = answer.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if allowed.contains(&c))
}

fn misalignment_details(record: &QuestionRecord, m: &Misalignment) -> String {
    let mask = record
        .mask
        .as_ref()
        .map(|s| s.mask.as_str())
        .unwrap_or_default();
    match m.reason {
        MisalignReason::FirstCharButMaskNotAtStart => format!(
            "Answer '{}' is 1st char of '{}', but mask '{}' is not start of '{}'.",
            record.answer, m.word, mask, m.reading
        ),
        MisalignReason::LastCharButMaskNotAtEnd => format!(
            "Answer '{}' is last char of '{}', but mask '{}' is not end of '{}'.",
            record.answer, m.word, mask, m.reading
        ),
        MisalignReason::MedialButMaskAtEdge => format!(
            "Answer '{}' is medial in '{}', but mask '{}' touches the edge of '{}'.",
            record.answer, m.word, mask, m.reading
        ),
    }
}

/// 1データ行の検査。指摘を行内の報告順で返す
///
/// 学年範囲チェックは許可集合が空のとき（問題集が無い学年）はスキップ
fn check_record(
    record: &QuestionRecord,
    grade: u32,
    allowed: &HashSet<char>,
    entries: &[&DictionaryEntry],
    opts: &AuditOptions,
    file: &str,
    line: usize,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    let issue = |kind, details| Issue {
        kind,
        file: file.to_string(),
        line,
        details,
    };

    let verdict = match &record.mask {
        Some(span) => align::validate(
            record,
            align::candidates(&record.answer, &span.mask, entries.iter().copied()),
            &opts.registry,
            opts.strict_medial,
        ),
        None => Verdict::NoMatch,
    };

    if let Verdict::KnownIrregular { word } = &verdict {
        issues.push(issue(
            IssueKind::PotentialIrregular,
            format!(
                "Word '{word}' is a Jukujikun. Asking for single char '{}' is valid only if \
                 reading split is standard (unlikely).",
                record.answer
            ),
        ));
    }

    if !allowed.is_empty() && !is_allowed(&record.answer, allowed) {
        issues.push(issue(
            IssueKind::OutOfGrade,
            format!(
                "Answer '{}' is not in Grade {grade} master list.",
                record.answer
            ),
        ));
    }

    if let Verdict::Misaligned(m) = &verdict {
        issues.push(issue(
            IssueKind::MaskAlignment,
            misalignment_details(record, m),
        ));
    }

    issues
}

/// この行を fix モードで削除すべきか
fn should_remove(issues: &[Issue]) -> bool {
    issues
        .iter()
        .any(|i| matches!(i.kind, IssueKind::OutOfGrade | IssueKind::PotentialIrregular))
}

/// 行末の改行 (\n / \r\n) を除いた部分を返す
fn strip_terminator(raw: &str) -> &str {
    raw.trim_end_matches('\n').trim_end_matches('\r')
}

/// コーパス全体を読み取り専用で検査する
pub fn audit(opts: &AuditOptions) -> Result<AuditReport> {
    let (catalogs, catalog_errors) =
        CatalogSet::load_all(&opts.catalog_dir, opts.min_grade..=opts.max_grade);
    for err in &catalog_errors {
        warn!("{err}");
    }

    let mut report = AuditReport::default();
    let empty_allowed: HashSet<char> = HashSet::new();
    for (grade, path) in corpus_files(opts)? {
        let basename = file_name(&path);
        debug!("auditing {basename} (grade {grade})");

        let allowed = match catalogs.get(grade) {
            Some(catalog) if !catalog.is_empty() => &catalog.allowed_kanji,
            _ => {
                // 問題集が無い学年は範囲チェックだけ外れる（情報として記録）
                info!("no master kanji list for grade {grade}; membership check skipped");
                &empty_allowed
            }
        };
        let entries = catalogs.resolution_entries(grade);

        let text = fs::read_to_string(&path)?;
        for (idx, line) in text.lines().enumerate() {
            if let ParsedLine::Record(rec) = record::parse_line(line) {
                report.issues.extend(check_record(
                    &rec,
                    grade,
                    allowed,
                    &entries,
                    opts,
                    &basename,
                    idx + 1,
                ));
            }
        }
    }
    Ok(report)
}

/// 規則違反の行を削除してコーパスを書き換える
///
/// Out-of-Grade と熟字訓だけを削除し、位置不整合は報告に留める。
/// ファイル全体を読み切ってから一度だけ書き戻す（途中失敗で壊さない）
pub fn fix(opts: &AuditOptions) -> Result<FixReport> {
    let (catalogs, catalog_errors) =
        CatalogSet::load_all(&opts.catalog_dir, opts.min_grade..=opts.max_grade);
    for err in &catalog_errors {
        warn!("{err}");
    }

    let mut report = FixReport::default();
    for (grade, path) in corpus_files(opts)? {
        let basename = file_name(&path);

        let allowed = match catalogs.get(grade) {
            Some(catalog) if !catalog.is_empty() => &catalog.allowed_kanji,
            _ => {
                // 許可漢字リストが無い学年は削除の根拠が無いので触らない
                info!("skipping {basename}: no master kanji list detected");
                continue;
            }
        };
        let entries = catalogs.resolution_entries(grade);
        info!("processing {basename} (grade {grade})");

        let text = fs::read_to_string(&path)?;
        let mut kept = String::with_capacity(text.len());
        let mut removed_in_file = 0usize;

        for (idx, raw) in text.split_inclusive('\n').enumerate() {
            let line = strip_terminator(raw);
            let ParsedLine::Record(rec) = record::parse_line(line) else {
                // コメント・空行・項目不足はそのまま残す
                kept.push_str(raw);
                continue;
            };

            let issues = check_record(&rec, grade, allowed, &entries, opts, &basename, idx + 1);
            if should_remove(&issues) {
                let reason = issues
                    .iter()
                    .find(|i| i.kind != IssueKind::MaskAlignment)
                    .map(|i| i.details.as_str())
                    .unwrap_or_default();
                info!("removing {basename}:{}: {line} ({reason})", idx + 1);
                removed_in_file += 1;
            } else {
                kept.push_str(raw);
                // 残した行の位置不整合は人間の確認用に積んでおく
                report
                    .misaligned
                    .extend(issues.into_iter().filter(|i| i.kind == IssueKind::MaskAlignment));
            }
        }

        if removed_in_file > 0 {
            fs::write(&path, kept)?;
            report.total_removed += removed_in_file;
            report.removed_per_file.push((basename, removed_in_file));
        }
    }
    Ok(report)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// --------------------------------------------------
// テスト
// --------------------------------------------------
