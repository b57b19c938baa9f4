// ============================================
// src/main.rs (メインファイル)
// ============================================

use std::path::PathBuf;
use std::process::ExitCode;

// 検査の中核モジュール
mod align;
mod audit;
mod catalog;
mod error;
mod record;

use clap::{Args, Parser, Subcommand};
use console::style;
use dialoguer::Confirm;

use crate::align::IrregularWordRegistry;
use crate::audit::{AuditOptions, Issue, IssueKind};
use crate::error::Result;

#[derive(Parser)]
#[command(name = "yomiwiz", version, about = "YOMI WiZ corpus checker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// コーパスを検査して指摘を一覧表示する（読み取り専用）
    Audit {
        #[command(flatten)]
        opts: CommonOpts,
    },
    /// 規則違反の行を削除してコーパスを書き換える
    Fix {
        #[command(flatten)]
        opts: CommonOpts,
        /// 確認プロンプトを出さずに書き換える
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct CommonOpts {
    /// コーパス (grade{N}.csv) のディレクトリ
    #[arg(long, default_value = "public/data")]
    data_dir: PathBuf,

    /// 問題集 (grade{N}.json) のディレクトリ
    #[arg(long, default_value = "問題集")]
    catalog_dir: PathBuf,

    /// 検査する学年の下限
    #[arg(long, default_value_t = 1)]
    min_grade: u32,

    /// 検査する学年の上限
    #[arg(long, default_value_t = 6)]
    max_grade: u32,

    /// 熟字訓リスト (単語→読み の JSON) を差し替える
    #[arg(long, value_name = "FILE")]
    jukujikun: Option<PathBuf>,

    /// 中間文字にもマスク位置の検査を掛ける（既定は先頭・末尾のみ）
    #[arg(long)]
    strict_medial: bool,
}

impl CommonOpts {
    fn into_options(self) -> Result<AuditOptions> {
        let registry = match &self.jukujikun {
            Some(path) => IrregularWordRegistry::load(path)?,
            None => IrregularWordRegistry::default(),
        };
        Ok(AuditOptions {
            data_dir: self.data_dir,
            catalog_dir: self.catalog_dir,
            min_grade: self.min_grade,
            max_grade: self.max_grade,
            strict_medial: self.strict_medial,
            registry,
        })
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Audit { opts } => run_audit(opts.into_options()?),
        Command::Fix { opts, yes } => run_fix(opts.into_options()?, yes),
    }
}

fn run_audit(opts: AuditOptions) -> Result<ExitCode> {
    let report = audit::audit(&opts)?;
    for issue in &report.issues {
        print_issue(issue);
    }
    println!("Found {} issues.", report.issues.len());

    // 位置不整合が残っている間は CI を赤くする
    if report.misaligned_count() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_fix(opts: AuditOptions, yes: bool) -> Result<ExitCode> {
    if !yes {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Rewrite corpus files under '{}'?",
                opts.data_dir.display()
            ))
            .default(false)
            .interact()?;
        if !proceed {
            println!("Aborted. No files were changed.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let report = audit::fix(&opts)?;
    for (file, removed) in &report.removed_per_file {
        println!("  -> Removed {removed} lines from {file}");
    }
    println!(
        "Cleanup complete. Total lines removed: {}",
        report.total_removed
    );

    // 自動削除しなかった位置不整合は要確認として表示する
    if !report.misaligned.is_empty() {
        println!(
            "{} {} misaligned line(s) kept; review them by hand:",
            style("note:").yellow().bold(),
            report.misaligned.len()
        );
        for issue in &report.misaligned {
            print_issue(issue);
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// 指摘1件を `[分類] file:line` + 説明文の2行で表示する
fn print_issue(issue: &Issue) {
    let label = match issue.kind {
        IssueKind::OutOfGrade => style(issue.kind.label()).red(),
        IssueKind::MaskAlignment => style(issue.kind.label()).red().bold(),
        IssueKind::PotentialIrregular => style(issue.kind.label()).yellow(),
    };
    println!("[{label}] {}:{}", issue.file, issue.line);
    println!("  -> {}", issue.details);
}
