mod access;
mod bot;
mod config;
mod course;
mod ledger;
mod quiz;
mod telegram;

use std::sync::Arc;

use teloxide::prelude::*;
use tokio::sync::Mutex;

use access::AccessGate;
use bot::CourseBot;
use config::Config;
use course::Catalog;
use ledger::Ledger;
use telegram::SharedBot;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;

    let mut logger = pretty_env_logger::formatted_builder();
    logger.parse_filters(&config.log_filter);
    logger.init();
    log::info!("Starting course bot...");

    let catalog = Catalog::load(config.courses_file.as_deref())?;
    let ledger = Ledger::load(config.results_file.clone());
    let state: SharedBot = Arc::new(Mutex::new(CourseBot::new(
        catalog,
        AccessGate::new(config.access_code),
        ledger,
    )));

    let bot = Bot::from_env();

    Dispatcher::builder(bot, telegram::schema())
        .dependencies(dptree::deps![state.clone()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher stopped, flushing quiz results");
    state.lock().await.flush();
    Ok(())
}
