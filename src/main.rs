use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podquery::{
    ApiClient, AppStore, ClipSort, DEFAULT_API_URL, DEFAULT_WEB_URL, EpisodeView,
    EpisodeViewType, HttpProbe, MediaRef, NoopObserver, PlaylistItem, PlaylistView, QueryState,
    ReqwestClient, SharedConnectivity, SharedObserver, StateObserver,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[e] ");
static SCISSORS: Emoji<'_, '_> = Emoji("✂️  ", "[c] ");
static NOTES: Emoji<'_, '_> = Emoji("📝 ", "");
static LIST: Emoji<'_, '_> = Emoji("📋 ", "");
static LINK: Emoji<'_, '_> = Emoji("🔗 ", "");

/// Browse episode clips, show notes and playlists
#[derive(Parser, Debug)]
#[command(name = "podquery")]
#[command(about = "Browse episode clips, show notes and playlists")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the podcast API
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Base URL used for share links
    #[arg(long, global = true, default_value = DEFAULT_WEB_URL)]
    web_url: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log requests and pagination decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the clips of an episode
    Clips {
        /// Episode id
        episode_id: String,

        /// Sort order: most-recent, top-past-day, top-past-week, top-past-month, top-past-year
        #[arg(short, long, default_value = "most-recent")]
        sort: ClipSort,

        /// Only clips matching this text
        #[arg(long)]
        search: Option<String>,

        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: usize,
    },

    /// Show the show notes of an episode
    Notes {
        /// Episode id
        episode_id: String,
    },

    /// Show a playlist and its items
    Playlist {
        /// Playlist id
        playlist_id: String,
    },
}

/// Shows clip loading progress on a spinner
struct SpinnerObserver {
    bar: ProgressBar,
}

impl StateObserver<MediaRef> for SpinnerObserver {
    fn state_changed(&self, state: &QueryState<MediaRef>) {
        let message = if state.is_loading {
            format!("{SEARCH}Loading clips...")
        } else if state.is_loading_more {
            format!(
                "{SEARCH}Loading more clips ({} loaded)...",
                state.items.len().to_string().cyan()
            )
        } else {
            format!(
                "{SCISSORS}{} of {} clips loaded",
                state.items.len().to_string().cyan(),
                state.total_count.unwrap_or(0).to_string().cyan()
            )
        };
        self.bar.set_message(message);
    }
}

fn spinner(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {wide_msg}")?);
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(bar)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "podquery=debug" } else { "podquery=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Format a clip offset as `m:ss` or `h:mm:ss`
fn format_time(seconds: u32) -> String {
    let (hours, minutes, seconds) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

fn clip_range(clip: &MediaRef) -> String {
    match clip.end_time {
        Some(end) => format!("{} - {}", format_time(clip.start_time), format_time(end)),
        None => format!("{} -", format_time(clip.start_time)),
    }
}

struct Output {
    json: bool,
    quiet: bool,
    web_url: String,
}

async fn run_clips(
    view: &mut EpisodeView<ReqwestClient>,
    output: &Output,
    sort: ClipSort,
    search: Option<String>,
    pages: usize,
    bar: &ProgressBar,
) -> Result<()> {
    bar.set_message(format!("{SEARCH}Fetching episode {}", view.episode_id().cyan()));
    view.initialize().await;
    if view.is_not_found() {
        bail!("Episode {} not found", view.episode_id());
    }

    view.select_sort(Some(sort)).await;
    if let Some(text) = &search {
        // Selecting the view below issues the search right away
        view.search(text).await;
    }
    let mut clips = view.select_view(Some(EpisodeViewType::Clips)).await;
    for _ in 1..pages {
        if clips.end_of_results {
            break;
        }
        clips = view.load_more().await;
    }
    bar.finish_and_clear();

    if output.json {
        let value = serde_json::json!({
            "episode": view.episode(),
            "clips": clips,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_episode_header(view);
    println!(
        "{SCISSORS}{} {} {}",
        "Clips".bold(),
        format!("({})", sort.label()).dimmed(),
        search
            .as_deref()
            .map(|text| format!("matching \"{}\"", text.yellow()))
            .unwrap_or_default()
    );
    for clip in &clips.items {
        println!(
            "  {} {}",
            format!("[{}]", clip_range(clip)).cyan(),
            truncate_title(clip.title.as_deref().unwrap_or("Untitled clip"), 60)
        );
    }
    if clips.items.is_empty() {
        println!("  {}", "No clips found".dimmed());
    }

    let total = clips.total_count.unwrap_or(0);
    println!(
        "\n{} of {} clips{}",
        clips.items.len().to_string().green().bold(),
        total.to_string().cyan(),
        if clips.end_of_results {
            String::new()
        } else {
            format!(" {}", "(use --pages to load more)".dimmed())
        }
    );
    if !output.quiet {
        println!("{LINK}{}", view.share_url(&output.web_url).dimmed());
    }

    Ok(())
}

async fn run_notes(view: &mut EpisodeView<ReqwestClient>, output: &Output) -> Result<()> {
    view.initialize().await;
    if view.is_not_found() {
        bail!("Episode {} not found", view.episode_id());
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(&view.episode())?);
        return Ok(());
    }

    print_episode_header(view);
    println!("{NOTES}{}", "Show notes".bold());
    println!("{}", view.show_notes().unwrap_or_default());
    if !output.quiet {
        println!("\n{LINK}{}", view.share_url(&output.web_url).dimmed());
    }

    Ok(())
}

fn print_episode_header(view: &EpisodeView<ReqwestClient>) {
    let Some(episode) = view.episode() else {
        return;
    };

    let podcast = episode
        .podcast
        .as_ref()
        .and_then(|podcast| podcast.title.as_deref())
        .unwrap_or_default();
    let published = episode
        .pub_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    println!(
        "{HEADPHONES}{} {}",
        episode
            .title
            .as_deref()
            .unwrap_or("Untitled episode")
            .bold()
            .green(),
        format!("{podcast} {published}").trim().dimmed()
    );
    println!();
}

async fn run_playlist(view: &mut PlaylistView<ReqwestClient>, output: &Output) -> Result<()> {
    view.initialize().await;
    let Some(playlist) = view.playlist() else {
        bail!("Playlist {} not found", view.playlist_id());
    };

    if output.json {
        let value = serde_json::json!({
            "playlist": playlist,
            "items": view.items(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{LIST}{} {}",
        playlist
            .title
            .as_deref()
            .unwrap_or("Untitled playlist")
            .bold()
            .green(),
        format!("{} items", view.total_count()).dimmed()
    );
    if let Some(owner) = playlist.owner.as_ref().and_then(|owner| owner.name.as_deref()) {
        println!("  by {}", owner.cyan());
    }
    if let Some(updated_at) = playlist.updated_at {
        println!("  updated {}", updated_at.format("%Y-%m-%d").to_string().dimmed());
    }
    println!();

    for item in view.items() {
        match &item {
            PlaylistItem::Clip(clip) => println!(
                "  {SCISSORS}{} {}",
                format!("[{}]", clip_range(clip)).cyan(),
                truncate_title(item.title().unwrap_or("Untitled clip"), 60)
            ),
            PlaylistItem::Episode(_) => println!(
                "  {HEADPHONES}{}",
                truncate_title(item.title().unwrap_or("Untitled episode"), 60)
            ),
        }
    }

    if !output.quiet {
        println!("\n{LINK}{}", view.share_url(&output.web_url).dimmed());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let output = Output {
        json: args.json,
        quiet: args.quiet,
        web_url: args.web_url.clone(),
    };
    let show_progress = !args.quiet && !args.json;

    if show_progress {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podquery".bold().magenta(),
            "- Podcast Browser".dimmed()
        );
    }

    let client = ReqwestClient::new();
    let api = Arc::new(
        ApiClient::from_str_url(client.clone(), &args.api_url).context("Invalid API URL")?,
    );
    let connectivity: SharedConnectivity = Arc::new(HttpProbe::new(client, args.api_url.clone()));
    let bar = spinner(!show_progress)?;

    let result = match args.command {
        Command::Clips {
            episode_id,
            sort,
            search,
            pages,
        } => {
            let observer: SharedObserver<MediaRef> = if show_progress {
                Arc::new(SpinnerObserver { bar: bar.clone() })
            } else {
                NoopObserver::shared()
            };
            let mut view = EpisodeView::new(
                api,
                connectivity,
                observer,
                episode_id,
                EpisodeViewType::ShowNotes,
            );
            run_clips(&mut view, &output, sort, search, pages.max(1), &bar)
                .await
                .context("Failed to list clips")
        }
        Command::Notes { episode_id } => {
            bar.set_message(format!("{SEARCH}Fetching episode {}", episode_id.cyan()));
            let mut view = EpisodeView::new(
                api,
                connectivity,
                NoopObserver::shared(),
                episode_id,
                EpisodeViewType::ShowNotes,
            );
            let result = run_notes(&mut view, &output).await;
            bar.finish_and_clear();
            result.context("Failed to show notes")
        }
        Command::Playlist { playlist_id } => {
            bar.set_message(format!("{SEARCH}Fetching playlist {}", playlist_id.cyan()));
            let mut view = PlaylistView::new(api, connectivity, AppStore::default(), playlist_id);
            let result = run_playlist(&mut view, &output).await;
            bar.finish_and_clear();
            result.context("Failed to show playlist")
        }
    };

    bar.finish_and_clear();
    result
}
