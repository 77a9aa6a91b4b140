use clap::Parser;
use mongo_fixture::{
    logging, ConnArgs, ConnConf, Connection, Dataset, Exporter, FixtureError, Interrupt, Result,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    conn: ConnArgs,
    /// output directory, created when missing.
    #[clap(short, long, default_value = "./export")]
    output: PathBuf,
    /// collections to export, by dataset or collection name.  Export all when not specified.
    #[clap(short, long, multiple_values = true)]
    collections: Vec<String>,
    /// don't print database statistics before exporting.
    #[clap(long)]
    no_stats: bool,
    /// log file path, if not specified, all log information will be output to stdout.
    #[clap(long)]
    log_path: Option<String>,
}

fn run(opts: &Opts) -> Result<bool> {
    let datasets = if opts.collections.is_empty() {
        Dataset::exported()
    } else {
        Dataset::lookup_all(&opts.collections)?
    };
    let conf = ConnConf::resolve(&opts.conn)?;
    let interrupt = Interrupt::register()?;
    let conn = Connection::open(&conf)?;

    let exporter = Exporter::new(&conn, &interrupt);
    if !opts.no_stats {
        exporter.stats(&datasets);
    }
    let summary = exporter.export_all(&opts.output, &datasets)?;
    for (dataset, stats) in summary.entries() {
        info!(
            collection = dataset.collection(),
            total = stats.total,
            exported = stats.exported,
            errors = stats.errors,
        );
    }
    Ok(summary.is_success())
}

fn main() {
    dotenvy::dotenv().ok();
    let opts: Opts = Opts::parse();
    let guard = logging::init(opts.log_path.as_deref());

    let code = match run(&opts) {
        Ok(true) => 0,
        Ok(false) => {
            warn!("Export finished with errors.");
            1
        }
        Err(FixtureError::Interrupted) => {
            warn!("Interrupted by operator, export aborted.");
            1
        }
        Err(e) => {
            error!(?e, "Export failed.");
            1
        }
    };
    drop(guard);
    std::process::exit(code);
}
