mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ScanArgs, SettingsCommand, WatchlistCommand};
use flipper_scanner::api::MarketplaceClient;
use flipper_scanner::core::logging::init_logging;
use flipper_scanner::core::{Config, StatusMessage};
use flipper_scanner::scanner::market::{profit_label, thumbnail_url, ConfidenceTier};
use flipper_scanner::scanner::{
    CatalogStore, CategoryFilter, Marketplace, Normalizer, ScanMetrics, ScanPage, ScanSession,
};
use flipper_scanner::watchlist::{
    ImportPolicy, KeyValueStore, SettingsSnapshot, SqliteStore, UserSettings, WatchCandidate,
    WatchlistStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.monitoring);

    tracing::info!("🚀 Flipper scanner starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Cli::parse();

    let storage: Arc<dyn KeyValueStore> =
        Arc::new(SqliteStore::new(&config.storage.database_path).await.with_context(|| {
            format!("opening database {}", config.storage.database_path)
        })?);
    let settings =
        UserSettings::new(storage.clone()).with_default_budget(config.scan.default_budget);

    match args.command {
        Commands::Scan(scan) => {
            let metrics = Arc::new(ScanMetrics::new());
            let client = MarketplaceClient::new(config.sources.clone())?;
            let catalog = CatalogStore::new(metrics.clone());
            catalog
                .load(&client, &Normalizer::default())
                .await
                .context("loading marketplace data")?;
            run_scan(&config, &catalog, &settings, storage, metrics, scan).await?;
        }
        Commands::Search { query, scan } => {
            let metrics = Arc::new(ScanMetrics::new());
            let client = MarketplaceClient::new(config.sources.clone())?;
            let catalog = CatalogStore::new(metrics.clone());
            catalog
                .load_search(&client, &Normalizer::default(), &query)
                .await
                .context("loading search results")?;
            run_scan(&config, &catalog, &settings, storage, metrics, scan).await?;
        }
        Commands::Watchlist(command) => run_watchlist(&config, storage, command).await?,
        Commands::Settings(command) => run_settings(&settings, command).await?,
    }

    Ok(())
}

async fn run_scan(
    config: &Config,
    catalog: &CatalogStore,
    settings: &UserSettings,
    storage: Arc<dyn KeyValueStore>,
    metrics: Arc<ScanMetrics>,
    args: ScanArgs,
) -> Result<()> {
    let stored = settings.snapshot().await?;

    let mut session = ScanSession::new(config.scan.page_size, metrics.clone());
    stored.apply_to(&mut session.filters);
    session.filters.category = CategoryFilter::parse(&args.category);
    session.filters.marketplaces = args
        .marketplace
        .iter()
        .filter(|m| !m.trim().is_empty())
        .map(|m| Marketplace::from(m.as_str()))
        .collect();
    session.filters.query = args.filter;
    if let Some(limit) = args.confidence_limit {
        session.filters.confidence_limit = limit;
    }
    if let Some(limit) = args.profit_limit {
        session.filters.profit_limit = limit;
    }
    if let Some(budget) = args.budget {
        session.filters.budget = budget;
    }
    session.set_sort(args.sort);

    let page = match session.scan(catalog).await {
        Ok(_) => session.go_to_page(args.page),
        Err(e) => {
            println!("{}", StatusMessage::from_error("scanning", &e));
            return Ok(());
        }
    };
    print_page(&page, &stored);

    if let Some(id) = args.analyze.as_deref() {
        match session.analyze(id, session.filters.budget) {
            Some(analysis) => {
                println!();
                println!("Profit analysis: {}", analysis.item_name);
                println!("  Buy price:       ${:.2}", analysis.price);
                println!("  Sell price:      ${:.2}", analysis.sell_price);
                println!(
                    "  Profit:          ${:.2} ({:.2}%)",
                    analysis.profit, analysis.profit_percent
                );
                println!("  Starting bid:    ${:.2}", analysis.starting_bid);
                println!("  Max bid:         ${:.2}", analysis.suggested_max_bid);
                println!("  Est. sell time:  {}", analysis.sell_time);
                if let Some(suggestion) = analysis.suggestion {
                    println!("  {}", suggestion);
                }
            }
            None => println!("{}", StatusMessage::error(format!("No item with id {}", id))),
        }
    }

    if !args.save.is_empty() {
        for id in &args.save {
            if !session.select(id) {
                tracing::warn!("Unknown item id: {}", id);
            }
        }
        let toolbar = session.toolbar(session.filters.budget);
        println!(
            "Selected: buy ${:.2}, profit ${:.2}, budget left ${:.2}",
            toolbar.total_buy_price,
            toolbar.total_profit,
            toolbar.remaining_budget()
        );

        let candidates: Vec<WatchCandidate> = session
            .selected_items()
            .into_iter()
            .map(WatchCandidate::from)
            .collect();
        let watchlist = WatchlistStore::new(storage);
        let summary = watchlist.add_many(candidates).await?;
        println!("{}", summary.message());
    }

    metrics.log_summary();
    Ok(())
}

fn print_page(page: &ScanPage, settings: &SettingsSnapshot) {
    println!("{}", page.status.message());
    if !page.has_valid_items {
        return;
    }

    for item in &page.items {
        println!(
            "{}  {} [{} / {}]  ${:.2} -> ${:.2}  profit ${:.2} ({})  confidence {:.0}% ({})",
            item.id,
            item.item_name,
            item.marketplace,
            item.category,
            item.price,
            item.sell_price,
            item.profit,
            profit_label(item.profit),
            item.confidence,
            ConfidenceTier::for_score(item.confidence).label(),
        );
        if settings.thumbnail_display {
            println!("    {}", thumbnail_url(item.image.as_deref(), &item.images));
        }
    }

    let info = page.info;
    println!(
        "Page {} of {} ({} items){}{}",
        info.page,
        info.total_pages,
        info.total_items,
        if info.has_prev { "  [prev]" } else { "" },
        if info.has_next { "  [next]" } else { "" },
    );
}

async fn run_watchlist(
    config: &Config,
    storage: Arc<dyn KeyValueStore>,
    command: WatchlistCommand,
) -> Result<()> {
    let watchlist = WatchlistStore::new(storage);

    match command {
        WatchlistCommand::List => {
            let entries = watchlist.get().await?;
            if entries.is_empty() {
                println!("Watchlist is empty.");
            }
            for entry in entries {
                println!(
                    "{}  {}  ${:.2}  profit ${:.2}  bid ${:.2}-${:.2}  sells in {}",
                    entry.id,
                    entry.label(),
                    entry.price,
                    entry.profit,
                    entry.starting_bid,
                    entry.suggested_max_bid,
                    entry.sell_time,
                );
            }
        }
        WatchlistCommand::Add {
            name,
            category,
            price,
            confidence,
            marketplace,
        } => {
            let candidate = WatchCandidate {
                item_name: name,
                category,
                price,
                confidence,
                marketplace,
                ..Default::default()
            };
            match watchlist.add(candidate).await {
                Ok(outcome) => println!("{}", outcome.message()),
                Err(e) => println!("{}", StatusMessage::from_error("saving to watchlist", &e)),
            }
        }
        WatchlistCommand::Clear => {
            watchlist.clear().await?;
            println!("{}", StatusMessage::success("Watchlist cleared!"));
        }
        WatchlistCommand::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.storage.export_dir.clone());
            let path = watchlist
                .export_to(&dir)
                .await
                .with_context(|| format!("exporting watchlist to {}", dir.display()))?;
            println!("{}", StatusMessage::success(format!("Exported to {}", path.display())));
        }
        WatchlistCommand::Import {
            file,
            legacy_half_price,
        } => {
            let policy = if legacy_half_price {
                ImportPolicy::LegacyHalfPrice
            } else {
                ImportPolicy::PreservePrice
            };
            match watchlist.with_import_policy(policy).import_file(&file).await {
                Ok(summary) => println!("{}", summary.message()),
                Err(e) => println!("{}", StatusMessage::from_error("importing watchlist", &e)),
            }
        }
    }

    Ok(())
}

async fn run_settings(settings: &UserSettings, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            let snapshot = settings.snapshot().await?;
            println!("Budget:            ${:.2}", snapshot.user_budget);
            println!("Confidence limit:  {}", snapshot.confidence_limit);
            println!("Profit limit:      {}", snapshot.profit_limit);
            println!("Thumbnails:        {}", snapshot.thumbnail_display);
        }
        SettingsCommand::Set {
            budget,
            confidence_limit,
            profit_limit,
            thumbnails,
        } => {
            if let Some(budget) = budget {
                settings.set_user_budget(budget).await?;
            }
            if let Some(limit) = confidence_limit {
                settings.set_confidence_limit(limit).await?;
            }
            if let Some(limit) = profit_limit {
                settings.set_profit_limit(limit).await?;
            }
            if let Some(enabled) = thumbnails {
                settings.set_thumbnail_display(enabled).await?;
            }
            println!("{}", StatusMessage::success("Settings saved."));
        }
    }
    Ok(())
}
