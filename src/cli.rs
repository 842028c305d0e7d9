//! Terminal front end: one subcommand per page.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::controller::{Applied, PageState, ViewStatus};
use crate::detail::DetailController;
use crate::error::{AppError, ControllerError, SettingsError};
use crate::labels::{
    days_until, format_release_date, rating_label, release_year, today, truncate_description,
};
use crate::media::{MediaFilter, MediaId, MediaSummary, MediaType, TimeWindow, UpcomingTab};
use crate::pages::{
    featured, load_home_sections, SearchPage, SearchStatus, TrendingPage, UpcomingPage,
};
use crate::route::Route;
use crate::settings::AppSettings;
use crate::tmdb::TmdbClient;

#[derive(Parser, Debug)]
#[command(name = "reelscout")]
#[command(version, about = "Browse movies and TV shows from TMDB", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to $XDG_CONFIG_HOME/reelscout/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub language: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Featured show plus the home carousels
    Home,
    Trending {
        #[arg(long, default_value = "day")]
        window: TimeWindow,
        #[arg(long, default_value = "all")]
        filter: MediaFilter,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Upcoming {
        #[arg(long, default_value = "movies")]
        tab: UpcomingTab,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search movies and TV shows at once
    Search {
        query: Vec<String>,
        #[arg(long, default_value = "all")]
        filter: MediaFilter,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Detail {
        media_type: MediaType,
        id: MediaId,
    },
    /// Open a route path such as `/search?q=batman` or `/show/1399`
    Open {
        route: String,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    About,
    /// Save `--api-key`/`--language` to the settings file, or print it
    Config {
        #[arg(long)]
        show: bool,
    },
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    if let Command::Config { show } = cli.command {
        return configure(&cli, show);
    }

    let mut settings = AppSettings::resolve(cli.config.as_deref())?;
    apply_flags(&mut settings, &cli);
    let client = TmdbClient::from_settings(&settings);

    match cli.command {
        Command::Home => home(&client).await,
        Command::Trending {
            window,
            filter,
            pages,
        } => trending(&client, window, filter, pages).await,
        Command::Upcoming { tab, pages } => upcoming(&client, tab, pages).await,
        Command::Search {
            ref query,
            filter,
            pages,
        } => search(&client, &query.join(" "), filter, pages).await,
        Command::Detail { media_type, id } => detail(&client, media_type, id).await,
        Command::Open { ref route, pages } => open(&client, Route::parse(route)?, pages).await,
        Command::About => {
            about();
            Ok(())
        }
        Command::Config { .. } => Ok(()),
    }
}

fn apply_flags(settings: &mut AppSettings, cli: &Cli) {
    if let Some(key) = cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        settings.api_key = key.trim().to_string();
    }
    if let Some(language) = cli.language.as_deref().filter(|l| !l.trim().is_empty()) {
        settings.language = language.trim().to_string();
    }
}

fn configure(cli: &Cli, show: bool) -> Result<(), AppError> {
    let path = match cli.config.clone().or_else(AppSettings::config_path) {
        Some(path) => path,
        None => return Err(SettingsError::NoConfigDir.into()),
    };

    if show {
        let mut settings = AppSettings::resolve(Some(path.as_path()))?;
        apply_flags(&mut settings, cli);
        println!("config file:   {}", path.display());
        if settings.has_credential() {
            println!("api key:       {}", settings.masked_api_key());
        } else {
            println!("api key:       (not set)");
        }
        println!("language:      {}", settings.language);
        println!("include adult: {}", settings.include_adult);
        println!("api base:      {}", settings.api_base_url);
        println!("image base:    {}", settings.image_base_url);
        return Ok(());
    }

    let mut settings = AppSettings::load_from(&path)?;
    apply_flags(&mut settings, cli);
    settings.save_to(&path)?;
    info!("settings saved to {}", path.display());
    println!("Saved settings to {}", path.display());
    Ok(())
}

async fn open(client: &TmdbClient, route: Route, pages: u32) -> Result<(), AppError> {
    info!(%route, "opening route");
    match route {
        Route::Home => home(client).await,
        Route::Trending => trending(client, TimeWindow::Day, MediaFilter::All, pages).await,
        Route::Upcoming => upcoming(client, UpcomingTab::Movies, pages).await,
        Route::About => {
            about();
            Ok(())
        }
        Route::Search { query } => search(client, &query, MediaFilter::All, pages).await,
        Route::Detail { media_type, id } => detail(client, media_type, id).await,
    }
}

/// `true` while another page can usefully be requested.
fn keep_paging(
    result: Result<Applied, ControllerError>,
    state: &PageState<MediaSummary>,
) -> Result<bool, AppError> {
    match result {
        Ok(_) => Ok(state.status == ViewStatus::Ready),
        Err(ControllerError::NoMoreResults) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn report_status(status: &ViewStatus) {
    if let ViewStatus::Error(msg) = status {
        eprintln!("warning: {}", msg);
    }
}

fn summary_line(rank: usize, item: &MediaSummary) -> String {
    let year = item
        .release_date
        .as_deref()
        .and_then(release_year)
        .unwrap_or_else(|| String::from("----"));
    format!(
        "{:>3}. {} ({}) [{}] {} {} {}",
        rank,
        item.title,
        year,
        item.media_type.label(),
        item.genre_label(),
        rating_label(item.vote_average),
        item.route()
    )
}

async fn home(client: &TmdbClient) -> Result<(), AppError> {
    let sections = load_home_sections(client).await?;

    if let Some(banner) = featured(&sections) {
        println!("Featured: {}  {}", banner.title, banner.route());
        println!("  {}", truncate_description(&banner.overview, 160));
        println!();
    }
    for section in &sections {
        println!("== {} ==", section.title());
        match &section.error {
            Some(err) => println!("  (unavailable: {})", err),
            None if section.items.is_empty() => println!("  (empty)"),
            None => {
                for (i, item) in section.items.iter().take(10).enumerate() {
                    println!("{}", summary_line(i + 1, item));
                }
            }
        }
        println!();
    }
    Ok(())
}

async fn trending(
    client: &TmdbClient,
    window: TimeWindow,
    filter: MediaFilter,
    pages: u32,
) -> Result<(), AppError> {
    let mut page = TrendingPage::new(client.clone());
    page.set_filter(filter);
    page.load(window).await?;
    for _ in 1..pages {
        let result = page.load_more().await;
        if !keep_paging(result, page.state())? {
            break;
        }
    }

    println!("Trending {} ({})", window, page.filter());
    for (rank, item) in page.ranked() {
        println!("{}", summary_line(rank, &item));
    }
    report_status(&page.state().status);
    Ok(())
}

async fn upcoming(client: &TmdbClient, tab: UpcomingTab, pages: u32) -> Result<(), AppError> {
    let mut page = UpcomingPage::new(client.clone());
    page.load(tab).await?;
    for _ in 1..pages {
        let result = page.load_more().await;
        if !keep_paging(result, page.state())? {
            break;
        }
    }

    let today = today();
    if let Some(item) = page.featured() {
        let countdown = page
            .featured_countdown(today)
            .unwrap_or_else(|| String::from("Out now"));
        println!(
            "Coming up: {} on {} ({})",
            item.title,
            format_release_date(item.release_date.as_deref()),
            countdown
        );
        println!();
    }
    println!("Upcoming {}", tab);
    for (i, item) in page.items().iter().enumerate() {
        let when = days_until(item.release_date.as_deref(), today)
            .unwrap_or_else(|| format_release_date(item.release_date.as_deref()));
        println!("{}  {}", summary_line(i + 1, item), when);
    }
    report_status(&page.state().status);
    Ok(())
}

async fn search(
    client: &TmdbClient,
    query: &str,
    filter: MediaFilter,
    pages: u32,
) -> Result<(), AppError> {
    let mut page = SearchPage::new(client.clone());
    page.set_filter(filter);
    page.search(query).await?;
    if page.status() != SearchStatus::EmptyQuery {
        for _ in 1..pages {
            let result = page.load_more().await;
            if !keep_paging(result, page.state())? {
                break;
            }
        }
    }

    match page.status() {
        SearchStatus::Ready => {
            println!(
                "{} results for \"{}\" ({})",
                page.total_results(),
                page.query(),
                page.filter()
            );
            for (i, item) in page.results().iter().enumerate() {
                println!("{}", summary_line(i + 1, item));
            }
            if page.can_load_more() {
                println!("(more available: --pages {})", page.state().current_page + 1);
            }
            report_status(&page.state().status);
        }
        status => {
            if let Some(message) = status.message() {
                println!("{}", message);
            }
        }
    }
    Ok(())
}

async fn detail(client: &TmdbClient, media_type: MediaType, id: MediaId) -> Result<(), AppError> {
    let mut controller = DetailController::new(client.clone());
    controller.load(media_type, id).await?;

    let view = match (controller.status(), controller.view()) {
        (ViewStatus::Ready, Some(view)) => view,
        (ViewStatus::NotFound, _) => {
            println!("{} {} was not found.", media_type.label(), id);
            return Ok(());
        }
        (status, _) => {
            warn!(%media_type, id, ?status, "detail unavailable");
            report_status(status);
            return Ok(());
        }
    };

    match &view.year {
        Some(year) => println!("{} ({})", view.title, year),
        None => println!("{}", view.title),
    }
    if let Some(tagline) = &view.tagline {
        println!("\"{}\"", tagline);
    }
    let mut facts = vec![
        view.type_label.to_string(),
        format!("{} ({}%)", view.rating, view.rating_percent),
        "*".repeat(view.full_stars as usize),
    ];
    facts.extend(view.runtime_label.clone());
    facts.extend(view.seasons_label.clone());
    facts.extend(view.status.clone());
    println!("{}", facts.join(" | "));
    if !view.genres.is_empty() {
        println!("Genres: {}", view.genres.join(", "));
    }
    println!();
    println!("{}", view.overview);
    println!();
    if !view.cast.is_empty() {
        println!("Cast:");
        for member in &view.cast {
            if member.character.is_empty() {
                println!("  {}", member.name);
            } else {
                println!("  {} as {}", member.name, member.character);
            }
        }
    }
    if let Some(url) = &view.trailer_url {
        println!("Trailer: {}", url);
    }
    println!("Poster:   {}", view.poster_url);
    println!("Backdrop: {}", view.backdrop_url);
    if !view.recommendations.is_empty() {
        println!("You may also like:");
        for (i, item) in view.recommendations.iter().enumerate() {
            println!("{}", summary_line(i + 1, item));
        }
    }
    Ok(())
}

fn about() {
    println!("reelscout: browse movies and TV shows from the terminal.");
    println!();
    println!("  home       featured show, now playing, trending and popular titles");
    println!("  search     movies and TV shows at once, filterable by type");
    println!("  upcoming   what is coming soon, with countdowns");
    println!("  trending   what the world watches today or this week");
    println!("  detail     cast, trailer, ratings and similar titles");
    println!();
    println!("This product uses the TMDB API but is not endorsed or certified by TMDB.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paginated_search() {
        let cli = Cli::try_parse_from([
            "reelscout", "search", "the", "dark", "knight", "--filter", "movies", "--pages", "3",
        ])
        .unwrap();
        match cli.command {
            Command::Search {
                query,
                filter,
                pages,
            } => {
                assert_eq!(query.join(" "), "the dark knight");
                assert_eq!(filter, MediaFilter::Movie);
                assert_eq!(pages, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "reelscout", "detail", "tv", "1399", "--language", "de-DE", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.language.as_deref(), Some("de-DE"));
        assert!(matches!(
            cli.command,
            Command::Detail {
                media_type: MediaType::Tv,
                id: 1399
            }
        ));
    }

    #[test]
    fn flags_override_resolved_settings() {
        let cli = Cli::try_parse_from([
            "reelscout", "home", "--api-key", " abc ", "--language", "fr-FR",
        ])
        .unwrap();
        let mut settings = AppSettings::default();
        apply_flags(&mut settings, &cli);
        assert_eq!(settings.api_key, "abc");
        assert_eq!(settings.language, "fr-FR");
    }

    #[test]
    fn summary_line_shows_year_type_and_route() {
        let mut item = crate::media::fixtures::movie(27205, "Inception");
        item.genre_ids = vec![28, 878, 12];
        let line = summary_line(1, &item);
        assert_eq!(
            line,
            "  1. Inception (2024) [Movie] Action + Science Fiction 7.0 /movie/27205"
        );

        let line = summary_line(2, &crate::media::fixtures::show(1399, "Game of Thrones"));
        assert_eq!(line, "  2. Game of Thrones (2024) [TV] Unknown 7.0 /show/1399");
    }
}
