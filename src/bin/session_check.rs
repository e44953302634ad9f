use taskboard::api::Api;
use taskboard::config::TaskboardConfig;
use taskboard::core::profile::Credentials;
use taskboard::navigation::{History, Page};
use taskboard::views::dashboard::{Dashboard, DashboardMessage};
use taskboard::views::{LoadingState, NotificationCenter, Services};

/// Journal logger that lets taskboard through at info (debug when toggled)
/// and everything else only at warn.
struct FilteredJournal {
    inner: systemd_journal_logger::JournalLog,
}

impl log::Log for FilteredJournal {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if metadata.target().starts_with("taskboard") || metadata.target().starts_with("session_check") {
            let max = if taskboard::debug_logging() {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            };
            metadata.level() <= max
        } else {
            metadata.level() <= log::LevelFilter::Warn
        }
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

fn install_logger() {
    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("taskboard-session-check".to_string()),
        Err(e) => {
            eprintln!("Journal unavailable, logging disabled: {}", e);
            return;
        }
    };
    if let Err(e) = log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })) {
        eprintln!("Failed to install logger: {}", e);
        return;
    }
    log::set_max_level(log::LevelFilter::Debug);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TaskboardConfig::load_or_default();
    taskboard::set_debug_logging(config.debug_logging);
    install_logger();

    println!("=== Session check: {} ===\n", config.base_url());
    let api = Api::new(&config)?;

    // Optional fresh login; otherwise there is no session and the gate says so.
    if let (Ok(email), Ok(password)) = (
        std::env::var("TASKBOARD_EMAIL"),
        std::env::var("TASKBOARD_PASSWORD"),
    ) {
        match api.account.login(&Credentials::new(email, password)).await {
            Ok(user) => println!(
                "Logged in as {}",
                user.email.or(user.name).unwrap_or_else(|| "(unknown)".to_string())
            ),
            Err(e) => {
                println!("Login failed: {}", e);
                return Ok(());
            }
        }
    }

    let notes = NotificationCenter::new();
    let loading = LoadingState::default();
    let history = History::at(Page::Dashboard);
    let services = Services {
        api: &api,
        notifier: &notes,
        loading: &loading,
        navigator: &history,
    };

    let mut dashboard = Dashboard::new(services);
    dashboard.update(DashboardMessage::Init).await;
    if !dashboard.authorized {
        println!("Not authenticated (would redirect to {})", Page::Auth.path());
        return Ok(());
    }
    for error in notes.errors() {
        println!("  ! {}", error);
    }

    println!("{}\n", dashboard.greeting());
    let now = chrono::Utc::now();
    for column in dashboard.columns() {
        println!("--- {} ({}) ---", column.status, column.count());
        for task in &column.tasks {
            let due = task
                .date
                .map(|d| d.with_timezone(&chrono::Local).format(" [due %Y-%m-%d %H:%M]").to_string())
                .unwrap_or_default();
            let flag = if task.is_overdue(now) { " OVERDUE" } else { "" };
            println!("  {}{}{}", task.title, due, flag);
        }
    }

    let overdue = dashboard.overdue(now).len();
    if overdue > 0 {
        println!("\n{} overdue task(s)", overdue);
    }
    Ok(())
}
