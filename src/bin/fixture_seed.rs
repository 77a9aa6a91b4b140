use clap::Parser;
use mongo_fixture::{
    logging, ConnArgs, ConnConf, Connection, Dataset, FixtureError, FixtureLayout, Interrupt,
    Result, SeedOptions, Seeder,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    conn: ConnArgs,
    /// directory holding the fixture files.
    #[clap(long, default_value = ".")]
    data_dir: PathBuf,
    /// only import these datasets, the seed order still applies.
    #[clap(long, multiple_values = true)]
    only: Vec<String>,
    /// read exporter output (`users_export.json`...) instead of fixture files.
    #[clap(long)]
    from_export: bool,
    /// overwrite existing documents instead of skipping them.
    #[clap(long)]
    force: bool,
    /// delete every document of the seeded collections before importing.
    #[clap(long)]
    cleanup: bool,
    /// don't ask for confirmation before cleanup.
    #[clap(short, long)]
    yes: bool,
    /// only print document counts, import nothing.
    #[clap(long)]
    verify_only: bool,
    /// log file path, if not specified, all log information will be output to stdout.
    #[clap(long)]
    log_path: Option<String>,
}

/// Ask the operator on stdin, anything but `y` declines.
fn confirm_cleanup(db_name: &str) -> bool {
    print!(
        "Delete all documents of the seeded collections in `{}`? (y/N): ",
        db_name
    );
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
        Err(_) => false,
    }
}

fn run(opts: &Opts) -> Result<bool> {
    let layout = if opts.from_export {
        FixtureLayout::Export
    } else {
        FixtureLayout::Fixture
    };
    let mut seed_opts = SeedOptions::new(opts.data_dir.clone())
        .force_update(opts.force)
        .layout(layout);
    if !opts.only.is_empty() {
        seed_opts = seed_opts.only(Dataset::lookup_all(&opts.only)?);
    }
    let conf = ConnConf::resolve(&opts.conn)?;
    let interrupt = Interrupt::register()?;
    let conn = Connection::open(&conf)?;
    let seeder = Seeder::new(&conn, &interrupt);

    if opts.verify_only {
        seeder.verify()?;
        return Ok(true);
    }
    if opts.cleanup {
        if opts.yes || confirm_cleanup(conn.get_db_name()) {
            let deleted = seeder.cleanup(&seed_opts.datasets())?;
            info!(deleted, "Cleanup complete.");
        } else {
            info!("Cleanup cancelled, continue importing.");
        }
    }

    let summary = seeder.seed(&seed_opts)?;
    for (dataset, stats) in summary.datasets.iter() {
        if !stats.is_success() {
            warn!(%dataset, failed = stats.failed, "Dataset has failed records.");
        }
    }
    Ok(summary.is_success())
}

fn main() {
    dotenvy::dotenv().ok();
    let opts: Opts = Opts::parse();
    let guard = logging::init(opts.log_path.as_deref());

    let code = match run(&opts) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(FixtureError::Interrupted) => {
            warn!("Interrupted by operator, seed aborted.");
            1
        }
        Err(e) => {
            error!(?e, "Seed failed.");
            1
        }
    };
    drop(guard);
    std::process::exit(code);
}
