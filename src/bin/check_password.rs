use clap::Parser;
use mongo_fixture::credential::{self, DEFAULT_PASSWORD, EXPORTED_HASH};
use mongo_fixture::logging;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    /// bcrypt hash to check.
    #[clap(long, default_value = EXPORTED_HASH)]
    hash: String,
    /// plaintext expected to match the hash.
    #[clap(long, default_value = DEFAULT_PASSWORD)]
    password: String,
    /// log file path, if not specified, all log information will be output to stdout.
    #[clap(long)]
    log_path: Option<String>,
}

fn main() {
    let opts: Opts = Opts::parse();
    let guard = logging::init(opts.log_path.as_deref());

    info!(hash = %opts.hash, "Check password hash.");
    let code = match credential::check_hash(&opts.password, &opts.hash) {
        Ok(true) => {
            info!("Password matches the hash.");
            0
        }
        Ok(false) => {
            warn!("Password doesn't match the hash, regenerate it with fix_user_passwords.");
            1
        }
        Err(e) => {
            error!(?e, "Malformed hash.");
            1
        }
    };
    drop(guard);
    std::process::exit(code);
}
