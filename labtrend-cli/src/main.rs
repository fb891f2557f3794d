use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use labtrend_core::{parse_value, ChartLayout, Evaluator, LabConfig};
use labtrend_records::{
    summarize_patient_str, InMemoryRepository, JsonFileRepository, LabReport, PatientRepository,
    PatientService, ReportQuery,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "labtrend",
    about = "Phân loại kết quả xét nghiệm và suy ra xu hướng từ bản ghi bệnh nhân."
)]
struct Args {
    /// Mức log khi RUST_LOG không được đặt.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// File cấu hình JSON (các trường thiếu dùng mặc định).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tạo báo cáo tổng hợp. Không có --input thì dùng bệnh nhân mẫu.
    Report {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Ngày mốc của báo cáo (YYYY-MM-DD).
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Phân loại một giá trị theo bảng dải của chỉ số.
    Classify {
        #[arg(short, long)]
        metric: String,
        #[arg(short, long, allow_hyphen_values = true)]
        value: String,
    },
    /// Suy xu hướng của một chỉ số trong file bản ghi.
    Trend {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        metric: String,
    },
    /// Dữ liệu biểu đồ dải tham chiếu cho một chỉ số.
    Chart {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        metric: String,
        #[arg(long, default_value_t = 320.0)]
        width: f64,
        #[arg(long, default_value_t = 200.0)]
        height: f64,
    },
    /// Thêm mối quan tâm vào file bản ghi.
    Prefer {
        #[arg(short, long)]
        store: PathBuf,
        preference: String,
    },
    /// Ghi lại trạng thái theo kết quả phân loại.
    Reconcile {
        #[arg(short, long)]
        store: PathBuf,
    },
    /// Lưu một báo cáo xét nghiệm (JSON) vào file bản ghi.
    AddReport {
        #[arg(short, long)]
        store: PathBuf,
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Lọc, sắp xếp và nhóm các báo cáo đã lưu.
    Reports {
        #[arg(short, long)]
        store: PathBuf,
        #[arg(long)]
        search: Option<String>,
        /// all | abnormal | recent
        #[arg(long)]
        tab: Option<String>,
        /// all | recent-abnormal | all-normal
        #[arg(long)]
        filter: Option<String>,
        /// all | 3m | 6m | 1y
        #[arg(long)]
        range: Option<String>,
        /// Lặp lại để chọn nhiều nhóm (blood, heart, vitamin, organ, urine).
        #[arg(long)]
        category: Vec<String>,
        /// newest | oldest
        #[arg(long)]
        sort: Option<String>,
        /// date | category
        #[arg(long)]
        group_by: Option<String>,
        /// Ngày mốc tính tuổi báo cáo (YYYY-MM-DD), mặc định hôm nay.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Ghi bệnh nhân mẫu ra file.
    Seed {
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let config = load_config(args.config.as_deref())?;
    debug!(?config, "configuration loaded");

    match args.command {
        Command::Report { input, as_of } => {
            let config = LabConfig {
                as_of: as_of.or(config.as_of),
                ..config
            };
            let report = match input {
                Some(path) => {
                    let data = std::fs::read_to_string(&path)
                        .with_context(|| format!("Không đọc được file {:?}", path))?;
                    summarize_patient_str(&data, &config)?
                }
                None => {
                    info!("no input given, reporting on the seed patient");
                    PatientService::new(
                        InMemoryRepository::seeded(),
                        Evaluator::with_config(config),
                    )
                    .report()?
                }
            };
            print_json(&serde_json::to_value(&report)?)?;
        }
        Command::Classify { metric, value } => {
            let value = parse_value(&value)?;
            let classification = Evaluator::with_config(config).classify(&metric, value)?;
            print_json(&serde_json::to_value(&classification)?)?;
        }
        Command::Trend { input, metric } => {
            let service = open_store(&input, config)?;
            let record = service.record()?;
            let Some(found) = record.metric(&metric) else {
                bail!("Không có chỉ số {metric} trong {:?}", input);
            };
            let evaluator = service.evaluator();
            let status = evaluator.derive_status(found, evaluator.anchor(&record.metrics))?;
            let trend = evaluator.trend(found, status)?;
            print_json(&serde_json::to_value(&trend)?)?;
        }
        Command::Chart {
            input,
            metric,
            width,
            height,
        } => {
            let service = open_store(&input, config)?;
            let chart = service.chart(&metric, &ChartLayout::with_size(width, height))?;
            match chart {
                Some(chart) => print_json(&serde_json::to_value(&chart)?)?,
                None => println!("Not enough data available"),
            }
        }
        Command::Prefer { store, preference } => {
            let service = open_store(&store, config)?;
            if service.add_preference(&preference)? {
                println!("Added preference {preference}");
            } else {
                println!("Preference {preference} already present");
            }
        }
        Command::Reconcile { store } => {
            let service = open_store(&store, config)?;
            let changed = service.reconcile_statuses()?;
            println!("Updated {changed} metric status(es)");
        }
        Command::AddReport { store, input } => {
            let data = std::fs::read_to_string(&input)
                .with_context(|| format!("Không đọc được file {:?}", input))?;
            let report: LabReport = serde_json::from_str(&data)
                .with_context(|| format!("Báo cáo không hợp lệ {:?}", input))?;
            let service = open_store(&store, config)?;
            let stored = service.add_report(report)?;
            println!("Stored report ({stored} in archive)");
        }
        Command::Reports {
            store,
            search,
            tab,
            filter,
            range,
            category,
            sort,
            group_by,
            as_of,
        } => {
            let mut fields = Map::new();
            for (key, value) in [
                ("search", search),
                ("tab", tab),
                ("status", filter),
                ("date_range", range),
                ("sort", sort),
                ("group_by", group_by),
            ] {
                if let Some(value) = value {
                    fields.insert(key.to_string(), Value::String(value));
                }
            }
            if !category.is_empty() {
                fields.insert("categories".to_string(), json!(category));
            }
            let query: ReportQuery =
                serde_json::from_value(Value::Object(fields)).context("Truy vấn không hợp lệ")?;

            let config = LabConfig {
                as_of: as_of.or(config.as_of),
                ..config
            };
            let groups = open_store(&store, config)?.reports(&query)?;
            print_json(&serde_json::to_value(&groups)?)?;
        }
        Command::Seed { output } => {
            let repository = JsonFileRepository::new(&output);
            repository.save(&labtrend_records::seed_patient())?;
            println!("Wrote seed patient to {}", output.display());
        }
    }

    Ok(())
}

fn open_store(path: &Path, config: LabConfig) -> anyhow::Result<PatientService<JsonFileRepository>> {
    if !path.exists() {
        bail!("Không tìm thấy file {:?}", path);
    }
    Ok(PatientService::new(
        JsonFileRepository::new(path),
        Evaluator::with_config(config),
    ))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LabConfig> {
    let Some(path) = path else {
        return Ok(LabConfig::default());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Không đọc được cấu hình {:?}", path))?;
    serde_json::from_str(&data).with_context(|| format!("Cấu hình không hợp lệ {:?}", path))
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("Mức log không hợp lệ '{log_level}'"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("Không khởi tạo được tracing: {err}"))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
