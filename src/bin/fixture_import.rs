use bson::oid::ObjectId;
use clap::{Args, Parser, Subcommand};
use mongo_fixture::{
    logging, ConnArgs, ConnConf, Connection, FixtureError, Interrupt, Result, SupplementImporter,
};
use std::path::PathBuf;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    conn: ConnArgs,
    /// log file path, if not specified, all log information will be output to stdout.
    #[clap(long)]
    log_path: Option<String>,
    #[clap(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// import additional exam records and knowledge progress.
    Learning {
        #[clap(flatten)]
        common: ImportArgs,
        /// also report exam and progress counts of this user id.
        #[clap(long, parse(try_from_str = parse_object_id))]
        focus_user: Option<ObjectId>,
    },
    /// import additional students and classes, then check class members.
    Classes {
        #[clap(flatten)]
        common: ImportArgs,
    },
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// directory holding the fixture files.
    #[clap(long, default_value = ".")]
    data_dir: PathBuf,
    /// overwrite existing documents instead of skipping them.
    #[clap(long)]
    force: bool,
}

fn parse_object_id(s: &str) -> std::result::Result<ObjectId, bson::oid::Error> {
    ObjectId::parse_str(s)
}

fn run(opts: &Opts) -> Result<bool> {
    let conf = ConnConf::resolve(&opts.conn)?;
    let interrupt = Interrupt::register()?;
    let conn = Connection::open(&conf)?;
    let importer = SupplementImporter::new(&conn, &interrupt);

    let summary = match &opts.mode {
        Mode::Learning { common, focus_user } => {
            importer.import_learning(&common.data_dir, common.force, *focus_user)?
        }
        Mode::Classes { common } => {
            let summary = importer.import_classes(&common.data_dir, common.force)?;
            importer.overview()?;
            summary
        }
    };
    Ok(summary.is_success())
}

fn main() {
    dotenvy::dotenv().ok();
    let opts: Opts = Opts::parse();
    let guard = logging::init(opts.log_path.as_deref());

    let code = match run(&opts) {
        Ok(true) => 0,
        Ok(false) => {
            warn!("Import finished with failed records.");
            1
        }
        Err(FixtureError::Interrupted) => {
            warn!("Interrupted by operator, import aborted.");
            1
        }
        Err(e) => {
            error!(?e, "Import failed.");
            1
        }
    };
    drop(guard);
    std::process::exit(code);
}
