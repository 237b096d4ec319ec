use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::json;

use scriptboost_api::domain::validation::{
    ValidationErrors, validate_long_form_input, validate_script_input,
};
use scriptboost_api::models::{
    ExportFormat, GeneratedScript, LongFormGenerated, LongFormInputForm, ScriptInputForm,
};
use scriptboost_client::library::ScriptLibrary;
use scriptboost_client::store::{KeyValueStore, default_store_path, open_or_memory};
use scriptboost_client::usage::{
    ESTIMATED_COST_USD, GenerationAnalytics, Surface, UsageConfig, UsageController,
};
use scriptboost_client::{ApiClient, ClientError, cancellable, logging};

/// Informational session allowance shown by `status`
const SESSION_LIMIT: u32 = 5;

#[derive(Parser)]
#[command(name = "scriptboost", about = "Generate short and long-form video scripts")]
struct Cli {
    /// API base URL
    #[arg(long, env = "SCRIPTBOOST_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// State file (history, favorites, usage)
    #[arg(long, env = "SCRIPTBOOST_STATE")]
    state: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a short-form script
    Generate {
        #[arg(long)]
        niche: String,
        #[arg(long)]
        audience: String,
        #[arg(long)]
        goal: String,
        #[arg(long)]
        tone: String,
        /// 15, 30 or 60 seconds
        #[arg(long, default_value_t = 30)]
        length: u32,
        #[arg(long)]
        platform: String,
        #[arg(long)]
        context: Option<String>,
        /// Print the raw JSON instead of the formatted script
        #[arg(long)]
        json: bool,
    },
    /// Generate a long-form outline and script
    Long {
        #[arg(long)]
        niche: String,
        #[arg(long)]
        audience: String,
        #[arg(long)]
        goal: String,
        #[arg(long)]
        tone: String,
        /// 3, 5, 10, 15 or 20 minutes
        #[arg(long, default_value_t = 10)]
        minutes: u32,
        #[arg(long)]
        chapters: bool,
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Apply a quick edit to a saved script
    Edit {
        id: String,
        /// shorter, longer, rewrite_hook or change_tone
        #[arg(long)]
        action: String,
        #[arg(long)]
        tone: Option<String>,
    },
    /// Download a saved script as pdf, docx, pptx or srt
    Export {
        id: String,
        #[arg(long, default_value = "srt")]
        format: String,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// List recent scripts
    History {
        #[arg(long)]
        favorites: bool,
        /// Dump as JSON (one script when an id is given)
        #[arg(long)]
        json: bool,
        id: Option<String>,
    },
    /// Toggle a script's favorite flag
    Favorite { id: String },
    /// Service availability and local usage
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ClientError>() {
            Some(client_error) => {
                tracing::debug!(error = %client_error, "command failed");
                eprintln!("{}", client_error.user_message());
            }
            None => eprintln!("error: {e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store: Arc<dyn KeyValueStore> =
        Arc::from(open_or_memory(&cli.state.clone().unwrap_or_else(default_store_path)));
    let library = ScriptLibrary::new(store.clone());
    let client = ApiClient::new(&cli.base_url)?.with_retry_observer(Arc::new(
        |attempt: u32, err: &ClientError, delay: Duration| {
            eprintln!(
                "retrying ({attempt}/3) in {:.1}s: {}",
                delay.as_secs_f32(),
                err.user_message()
            );
        },
    ));

    match cli.command {
        Command::Generate {
            niche,
            audience,
            goal,
            tone,
            length,
            platform,
            context,
            json,
        } => {
            let input = validate_script_input(&ScriptInputForm {
                niche: Some(niche),
                target_audience: Some(audience),
                content_goal: Some(goal),
                tone: Some(tone),
                script_length: Some(json!(length)),
                platform: Some(platform),
                additional_context: context,
            })
            .map_err(invalid)?;

            let usage = UsageController::new(Surface::Short, UsageConfig::default(), store.clone());
            let started = Instant::now();
            let script = interruptible(usage.enqueue(client.generate_script(&input))).await;
            let script = record(&usage, script, &input.niche, input.tone.as_str())?;
            client.send_metrics(json!([{
                "event": "generate",
                "platform": input.platform,
                "ms": started.elapsed().as_millis() as u64,
            }]));

            library.save(&script)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&script)?);
            } else {
                print_script(&script);
            }
        }

        Command::Long {
            niche,
            audience,
            goal,
            tone,
            minutes,
            chapters,
            context,
            json,
        } => {
            let input = validate_long_form_input(&LongFormInputForm {
                niche: Some(niche),
                target_audience: Some(audience),
                content_goal: Some(goal),
                tone: Some(tone),
                video_length_minutes: Some(json!(minutes)),
                chapter_segmentation: Some(chapters),
                additional_context: context,
            })
            .map_err(invalid)?;

            let usage = UsageController::new(Surface::Long, UsageConfig::default(), store.clone());
            let generated = interruptible(usage.enqueue(client.generate_long_form(&input))).await;
            let generated = record(&usage, generated, &input.niche, input.tone.as_str())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&generated)?);
            } else {
                print_long_form(&generated);
            }
        }

        Command::Edit { id, action, tone } => {
            let script = find(&library, &id)?;
            let edited = client.quick_edit(&script, &action, tone.as_deref()).await?;
            library.update(&edited)?;
            print_script(&edited);
        }

        Command::Export { id, format, out } => {
            let format = ExportFormat::parse(&format)
                .ok_or_else(|| anyhow!("format must be one of pdf, docx, pptx, srt"))?;
            let script = find(&library, &id)?;
            let file = client.export(&script, format).await?;
            let path = out.join(&file.filename);
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }

        Command::History { favorites, json, id } => {
            if json {
                match library.export_json(id.as_deref())? {
                    Some(dump) => println!("{dump}"),
                    None => bail!("no script with id {}", id.unwrap_or_default()),
                }
                return Ok(());
            }
            let history = library.history();
            for script in &history.scripts {
                let favorite = history.favorite_scripts.contains(&script.id);
                if favorites && !favorite {
                    continue;
                }
                println!(
                    "{} {} [{} · {}s] {}",
                    if favorite { "★" } else { " " },
                    script.id,
                    script.platform,
                    script.total_duration,
                    script.hook.text
                );
            }
            println!("{} generated in total", history.total_generated);
        }

        Command::Favorite { id } => {
            find(&library, &id)?;
            let now = library.toggle_favorite(&id)?;
            println!("{}", if now { "added to favorites" } else { "removed from favorites" });
        }

        Command::Status => {
            let available = client.service_available().await?;
            println!(
                "service: {}",
                if available { "available" } else { "temporarily unavailable" }
            );
            for surface in [Surface::Short, Surface::Long] {
                let usage = UsageController::new(surface, UsageConfig::default(), store.clone());
                let (session, remaining) = usage.session_info(SESSION_LIMIT);
                let metrics = usage.daily_metrics();
                println!(
                    "{}: {} this session ({} of {} left), {} today, ~${:.3}",
                    surface.as_str(),
                    session.count,
                    remaining,
                    SESSION_LIMIT,
                    metrics.total_generations,
                    metrics.costs_usd
                );
            }
        }
    }
    Ok(())
}

/// Abandon the generation on Ctrl-C
async fn interruptible<T>(
    generation: impl std::future::Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    let (handle, generation) = cancellable(generation);
    tokio::pin!(generation);
    tokio::select! {
        result = &mut generation => result,
        _ = tokio::signal::ctrl_c() => {
            handle.cancel();
            generation.await
        }
    }
}

fn record<T>(
    usage: &UsageController,
    result: Result<T, ClientError>,
    niche: &str,
    tone: &str,
) -> Result<T> {
    match result {
        Ok(value) => {
            usage.record_success(&GenerationAnalytics {
                niche: Some(niche.to_string()),
                tone: Some(tone.to_string()),
                estimated_cost_usd: Some(ESTIMATED_COST_USD),
            });
            Ok(value)
        }
        Err(e) => {
            usage.record_failure();
            Err(e.into())
        }
    }
}

fn find(library: &ScriptLibrary, id: &str) -> Result<GeneratedScript> {
    library
        .get(id)
        .ok_or_else(|| anyhow!("no script with id {id} in history"))
}

fn invalid(errors: ValidationErrors) -> anyhow::Error {
    let lines: Vec<String> = errors
        .iter()
        .map(|e| format!("  {}: {}", e.field, e.message))
        .collect();
    anyhow!("invalid input:\n{}", lines.join("\n"))
}

fn print_script(script: &GeneratedScript) {
    println!("id: {}", script.id);
    println!("\nHOOK ({}s)\n{}", script.hook.duration, script.hook.text);
    println!("\nBODY ({}s)\n{}", script.body.duration, script.body.text);
    for point in &script.body.key_points {
        println!("  - {point}");
    }
    println!("\nCTA\n{}", script.cta.text);
    if !script.hashtags.is_empty() {
        let tags: Vec<String> = script.hashtags.iter().map(|h| format!("#{h}")).collect();
        println!("\n{}", tags.join(" "));
    }
    println!("\ntotal: {}s on {}", script.total_duration, script.platform);
}

fn print_long_form(generated: &LongFormGenerated) {
    println!("id: {} ({} min)", generated.id, generated.total_minutes);
    if let Some(chapters) = &generated.chapters {
        println!("\nCHAPTERS");
        for chapter in chapters {
            println!("  {} {}", chapter.start, chapter.title);
        }
    }
    println!("\nINTRO\n{}", generated.script.intro);
    for section in &generated.script.sections {
        println!("\n{}\n{}", section.title.to_uppercase(), section.content);
    }
    println!("\nOUTRO\n{}", generated.script.outro);
    if !generated.ctas.is_empty() {
        println!("\nCTAs");
        for cta in &generated.ctas {
            println!("  - {cta}");
        }
    }
}
