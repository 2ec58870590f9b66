//! QuestForge engine - command line entry point.
//!
//! Drives the generation services from the terminal: `generate` runs a full
//! pipeline pass and saves the draft, `list` and `delete` manage saved
//! quests.

use std::str::FromStr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questforge_domain::{climax_indices, route_metrics, Difficulty, QuestId};
use questforge_engine::app::App;
use questforge_engine::application::ports::outbound::GenerationInput;
use questforge_engine::infrastructure::persistence::{connect, SqliteQuestStore};
use questforge_engine::infrastructure::{HttpCoverArtClient, HttpDialogueClient, HttpPipelineClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questforge_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("QUESTFORGE_DB_PATH").unwrap_or_else(|_| "sqlite://questforge.db".into());
    let pool = connect(&database_url).await?;
    let store = Arc::new(SqliteQuestStore::new(pool).await?);

    let app = App::new(
        Arc::new(HttpPipelineClient::from_env()),
        Arc::new(HttpCoverArtClient::from_env()),
        Arc::new(HttpDialogueClient::from_env()),
        store,
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((cmd, rest)) if cmd == "generate" && !rest.is_empty() => {
            generate(&app, rest.join(" ")).await?;
        }
        Some((cmd, _)) if cmd == "list" => {
            list(&app).await?;
        }
        Some((cmd, [id])) if cmd == "delete" => {
            let quest_id = QuestId::from_uuid(uuid::Uuid::parse_str(id)?);
            app.mapper().delete(quest_id).await?;
            println!("Deleted {}", quest_id);
        }
        _ => {
            eprintln!("Usage: questforge-engine <generate PROMPT... | list | delete QUEST_ID>");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn generate(app: &App, prompt: String) -> anyhow::Result<()> {
    let difficulty = std::env::var("QUESTFORGE_DIFFICULTY")
        .ok()
        .and_then(|v| Difficulty::from_str(&v).ok())
        .unwrap_or_default();
    let scene_count = std::env::var("QUESTFORGE_SCENE_COUNT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(6);

    let session = app.open_session();
    session
        .orchestrator
        .generate(GenerationInput {
            prompt,
            difficulty,
            scene_count,
            ..GenerationInput::default()
        })
        .await?;

    // Cover art and dialogue run in the background; for a one-shot CLI run
    // we wait so the save below captures them.
    session.orchestrator.wait_for_auxiliary().await;

    let quest_id = app.save_session(&session).await?;

    let draft = session
        .draft
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone();
    let metrics = route_metrics(&draft.scenes);

    println!("Saved quest {}", quest_id);
    println!("  {} ({})", draft.title, draft.difficulty);
    println!("  {} scenes in {}", draft.scenes.len(), draft.area);
    println!(
        "  route: {:.1} km, about {} min on foot",
        metrics.total_km, metrics.total_minutes
    );
    let climaxes = climax_indices(&draft.scenes);
    if !climaxes.is_empty() {
        println!("  turning points at stops {:?}", climaxes);
    }

    Ok(())
}

async fn list(app: &App) -> anyhow::Result<()> {
    let summaries = app.mapper().list().await?;
    if summaries.is_empty() {
        println!("No saved quests");
        return Ok(());
    }
    for s in summaries {
        println!(
            "{}  {}  [{}] {} scenes, {}",
            s.id, s.title, s.difficulty, s.scene_count, s.status
        );
    }
    Ok(())
}
