use std::error::Error;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};

use github_dork_helper_lib::{
    collect_input_files, collection, load_search_urls, Args, CollectionCommand, Command,
    GitHubSearcher, QueryDescriptor, SearchArgs, SearchConfig, Shutdown, TokenPool,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize the tracing logger
    tracing_subscriber::fmt::init();

    dotenv().ok();

    let args = Args::parse();

    match args.command {
        Command::Search(search) => run_search(search).await,
        Command::Collection(command) => run_collection(command).await,
    }
}

async fn run_search(args: SearchArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let tokens = TokenPool::resolve(&args.tokens, &args.token_file).map_err(|e| {
        error!("{}", e);
        e
    })?;

    let config = SearchConfig::from_args(&args);
    let hit_log = config.hit_log();
    if !config.keep_logs {
        hit_log.reset().await?;
    }

    let exclude = vec![
        args.token_file.clone(),
        hit_log.verbose_path().to_path_buf(),
        hit_log.minimal_path().to_path_buf(),
    ];
    let files = collect_input_files(&args.inputs, &exclude).await?;
    let urls = load_search_urls(&files).await?;
    info!(
        "Found {} unique search URL(s) in {} file(s)",
        urls.len(),
        files.len()
    );
    if urls.is_empty() {
        warn!("Nothing to search");
        return Ok(());
    }

    let queries: Vec<QueryDescriptor> = urls
        .iter()
        .map(|url| QueryDescriptor::from_url(url))
        .collect();

    let mut searcher = GitHubSearcher::new(config, tokens, Shutdown::on_ctrl_c())?;
    searcher.run(&queries).await;

    info!(
        "Hits saved to '{}' and '{}'",
        hit_log.verbose_path().display(),
        hit_log.minimal_path().display()
    );
    Ok(())
}

async fn run_collection(command: CollectionCommand) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        CollectionCommand::Dedupe(file) => {
            let mut data = collection::load(&file.collection_file).await?;
            let removed = collection::dedupe(&mut data);
            let output = file.output.unwrap_or_else(|| {
                collection::derived_path(&file.collection_file, "deduped", None)
            });
            collection::save(&output, &data).await?;
            info!("Removed {} duplicate(s). Saved to {}", removed, output.display());
        }
        CollectionCommand::Api(file) => {
            let mut data = collection::load(&file.collection_file).await?;
            let dropped = collection::filter_api(&mut data);
            let output = file
                .output
                .unwrap_or_else(|| collection::derived_path(&file.collection_file, "api", None));
            collection::save(&output, &data).await?;
            info!(
                "Dropped {} non-API request(s). Saved to {}",
                dropped,
                output.display()
            );
        }
        CollectionCommand::Baseurl { file, base_url } => {
            let mut data = collection::load(&file.collection_file).await?;
            let dropped = collection::filter_base_url(&mut data, &base_url)?;
            let output = file.output.unwrap_or_else(|| {
                collection::derived_path(&file.collection_file, &base_url, None)
            });
            collection::save(&output, &data).await?;
            info!(
                "Dropped {} request(s) outside '{}'. Saved to {}",
                dropped,
                base_url,
                output.display()
            );
        }
        CollectionCommand::Pipeline {
            collection_file,
            output_dir,
        } => {
            let (deduped, api) =
                collection::run_pipeline(&collection_file, output_dir.as_deref()).await?;
            info!("Deduplicated: {}", deduped.display());
            info!("API only: {}", api.display());
        }
    }
    Ok(())
}
