use clap::Parser;
use mongo_fixture::credential::{self, DEFAULT_COST, DEFAULT_PASSWORD};
use mongo_fixture::logging;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    /// users fixture to rewrite in place.
    #[clap(long, default_value = "users.json")]
    users_file: PathBuf,
    /// plaintext password shared by every account.
    #[clap(long, default_value = DEFAULT_PASSWORD)]
    password: String,
    /// bcrypt cost.
    #[clap(long, default_value_t = DEFAULT_COST)]
    cost: u32,
    /// log file path, if not specified, all log information will be output to stdout.
    #[clap(long)]
    log_path: Option<String>,
}

fn main() {
    let opts: Opts = Opts::parse();
    let guard = logging::init(opts.log_path.as_deref());

    let code = match credential::rewrite_users_file(&opts.users_file, &opts.password, opts.cost) {
        Ok(summary) => {
            info!("Accounts available for login:");
            for account in summary.accounts.iter() {
                info!(
                    role = %credential::role_title(&account.role),
                    username = %account.username,
                    email = %account.email,
                );
            }
            0
        }
        Err(e) => {
            error!(
                ?e,
                file = %opts.users_file.display(),
                "Rewrite password hashes failed, file untouched."
            );
            1
        }
    };
    drop(guard);
    std::process::exit(code);
}
