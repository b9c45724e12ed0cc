use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::sync::{Arc, Mutex};

use taskboard::data::init_schema;
use taskboard::notify::{ConsoleNotifier, Notifier};
use taskboard::store::adapter::SqliteStore;
use taskboard::store::client::Store;
use taskboard::views::reminders::ReminderEngine;

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let connection = Connection::open("taskboard.db")?;
    init_schema(&connection)?;
    let connection = Arc::new(Mutex::new(connection));

    let adapter = SqliteStore::new(connection);
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let store = Store::new(adapter.clone(), notifier.clone());

    // Deadline badge and toasts, fed by the same snapshot stream the REST
    // mutations push to.
    let reminders = ReminderEngine::new(store, notifier);
    reminders.start_interval();

    taskboard::rocket(adapter).launch().await?;

    Ok(())
}
