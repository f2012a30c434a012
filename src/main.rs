use awb::cli::{Cli, Commands};
use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` or `grep -q` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(global.verbose);

    match cli.command {
        Commands::Init(args) => awb::cli::commands::init::run(args, &global),
        Commands::Project(cmd) => awb::cli::commands::project::run(cmd, &global),
        Commands::Epic(cmd) => awb::cli::commands::epic::run(cmd, &global),
        Commands::Story(cmd) => awb::cli::commands::story::run(cmd, &global),
        Commands::Sprint(cmd) => awb::cli::commands::sprint::run(cmd, &global),
        Commands::Team(cmd) => awb::cli::commands::team::run(cmd, &global),
        Commands::Raci(cmd) => awb::cli::commands::raci::run(cmd, &global),
        Commands::Retro(cmd) => awb::cli::commands::retro::run(cmd, &global),
        Commands::Decision(cmd) => awb::cli::commands::decision::run(cmd, &global),
        Commands::Risk(cmd) => awb::cli::commands::risk::run(cmd, &global),
        Commands::Export(cmd) => awb::cli::commands::export::run(cmd, &global),
        Commands::Status(args) => awb::cli::commands::status::run(args, &global),
        Commands::Completions(args) => awb::cli::commands::completions::run(args),
    }
}

/// Log to stderr; `AWB_LOG` overrides the level, `--verbose` defaults to debug
fn init_logging(verbose: bool) {
    let default_level = if verbose { "awb=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("AWB_LOG")
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}
