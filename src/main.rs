// ==========================================
// 公寓运营后台 - 批量导入命令行入口
// ==========================================
// 子命令: template / validate / import / catalog-add / catalog-list
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use housing_import::api::{ImportApi, PreviewResponse};
use housing_import::domain::{ImportOutcome, ProgressSnapshot, RowValidation};
use housing_import::i18n::t_with_args;
use housing_import::importer::{CancelFlag, Delimiter};
use housing_import::logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "housing-import", version, about = "公寓运营后台 - 批量表格导入")]
struct Cli {
    /// SQLite 数据库路径
    #[arg(long, env = "HOUSING_IMPORT_DB_PATH", global = true)]
    db: Option<String>,

    /// 消息语言（en / zh-CN），优先于数据库配置
    #[arg(long, global = true)]
    locale: Option<String>,

    /// 日志格式
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// 以 JSON 输出结果
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 导出导入模板
    Template {
        /// 导入类型（lead / studio）
        entity: String,
        /// 分隔符（, ; tab |）
        #[arg(long, default_value = ",")]
        delimiter: String,
        /// 输出文件（缺省时写到 stdout）
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// 校验文件（不写入）
    Validate { entity: String, file: String },
    /// 校验并导入文件
    Import { entity: String, file: String },
    /// 新增引用目录条目
    CatalogAdd { kind: String, name: String },
    /// 查询引用目录
    CatalogList { kind: String },
}

/// 默认数据库路径: 用户数据目录/housing-import/housing_import.db
fn default_db_path() -> String {
    let mut path = PathBuf::from("./housing_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("housing-import");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("housing_import.db");
        }
    }
    path.to_string_lossy().to_string()
}

fn print_issues(results: &[RowValidation]) {
    for row in results {
        for issue in &row.errors {
            println!("  第 {} 行 [ERROR]   {}", row.row_number, issue.message);
        }
        for issue in &row.warnings {
            println!("  第 {} 行 [WARNING] {}", row.row_number, issue.message);
        }
    }
}

fn print_preview(preview: &PreviewResponse) {
    let s = &preview.summary;
    println!(
        "{}: {} 行，可导入 {} 行，错误行 {}（{} 个错误），警告行 {}（{} 个警告）",
        preview.entity,
        s.total_rows,
        s.importable_rows,
        s.error_rows,
        s.error_count,
        s.warning_rows,
        s.warning_count
    );
    print_issues(&preview.issues);
}

fn print_outcome(outcome: &ImportOutcome) {
    println!(
        "导入完成: 成功 {}，失败 {}，跳过 {}，耗时 {} ms",
        outcome.succeeded, outcome.failed, outcome.skipped, outcome.elapsed_ms
    );
    for err in &outcome.errors {
        println!("  第 {} 行: {}", err.row_number, err.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.log_format {
        LogFormat::Text => logging::init(),
        LogFormat::Json => logging::init_json(),
    }

    let db_path = cli.db.clone().unwrap_or_else(default_db_path);
    tracing::debug!(db_path = %db_path, "使用数据库");
    let api = ImportApi::new(db_path).with_locale(cli.locale.clone());

    match cli.command {
        Command::Template {
            entity,
            delimiter,
            output,
        } => {
            let delimiter = Delimiter::parse(&delimiter)
                .with_context(|| format!("无法识别的分隔符: {}", delimiter))?;
            let text = api.template(&entity, Some(delimiter))?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("写入模板失败: {}", path.display()))?;
                    println!("模板已写入 {}", path.display());
                }
                None => print!("{}", text),
            }
        }

        Command::Validate { entity, file } => {
            let preview = api.preview(&entity, &file).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                print_preview(&preview);
            }
            if !preview.importable {
                std::process::exit(1);
            }
        }

        Command::Import { entity, file } => {
            // Ctrl-C: 当前行完成后停止
            let cancel = CancelFlag::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    trigger.cancel();
                }
            });

            let show_progress = !cli.json;
            let sink = move |p: &ProgressSnapshot| {
                if show_progress {
                    eprintln!(
                        "[{}/{}] 成功 {} 失败 {}",
                        p.processed, p.total, p.succeeded, p.failed
                    );
                }
            };

            let response = match api.import_file(&entity, &file, &sink, Some(cancel)).await {
                Ok(r) => r,
                Err(housing_import::ApiError::ImportBlocked { error_rows }) => {
                    // 给出问题清单，便于修正源文件
                    let preview = api.preview(&entity, &file).await?;
                    print_preview(&preview);
                    bail!("存在 {} 行校验错误，未执行导入", error_rows);
                }
                Err(e) => return Err(e.into()),
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_outcome(&response.outcome);
                if response.outcome.cancelled {
                    let processed = response.outcome.attempted().to_string();
                    let total = (response.summary.importable_rows).to_string();
                    println!(
                        "{}",
                        t_with_args(
                            "import.cancelled",
                            &[("processed", &processed), ("total", &total)]
                        )
                    );
                }
            }
            if response.outcome.has_failures() {
                std::process::exit(2);
            }
        }

        Command::CatalogAdd { kind, name } => {
            let entry = api.add_catalog_entry(&kind, &name)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("{}\t{}", entry.id, entry.name);
            }
        }

        Command::CatalogList { kind } => {
            let entries = api.list_catalog(&kind)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("{}\t{}", entry.id, entry.name);
                }
            }
        }
    }

    Ok(())
}
