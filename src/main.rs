use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use draftsmith::ai::{CompletionClient, Tone};
use draftsmith::config::Config;
use draftsmith::credentials::CredentialStore;
use draftsmith::draft::{DraftRequest, Drafter};
use draftsmith::retrieval::{RetrievalStrategy, Retriever};
use draftsmith::templates::TemplateStore;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,draftsmith=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir))
        .map(|dir| dir.join("draftsmith.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"draftsmith - Draft emails from a short request

Usage: draftsmith <command> [options]

Commands:
    draft <request...>    Draft an email
        --tone <formal|professional|casual>   (default: professional)
        --to <name>                           Recipient name
        --from <name>                         Sender name
        --top-k <n>                           Templates to embed in the prompt
        --strategy <overlap|trigger|fuzzy>    Retrieval strategy
        --templates <dir>                     Template directory
        --scores                              Also print template relevance
    scores <request...>   Show template relevance for a request
    templates             List loaded templates
    setup                 Store the API key
    help                  Show this help message

Configuration file: ~/.config/draftsmith/config.toml
API key: OPENAI_API_KEY, ai.api_key in the config, or 'draftsmith setup'
"#
    );
}

#[derive(Debug, Default)]
struct DraftArgs {
    request: DraftRequest,
    top_k: Option<usize>,
    strategy: Option<RetrievalStrategy>,
    templates: Option<PathBuf>,
    scores: bool,
}

fn parse_draft_args(args: &[String]) -> Result<DraftArgs> {
    let mut parsed = DraftArgs::default();
    let mut words = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("Missing value for {}", flag))
        };
        match arg.as_str() {
            "--tone" => {
                parsed.request.tone = value("--tone")?
                    .parse::<Tone>()
                    .map_err(anyhow::Error::msg)?
            }
            "--to" => parsed.request.recipient = value("--to")?,
            "--from" => parsed.request.sender = value("--from")?,
            "--top-k" => {
                let top_k = value("--top-k")?
                    .parse::<usize>()
                    .context("--top-k must be a positive number")?;
                anyhow::ensure!(top_k > 0, "--top-k must be at least 1");
                parsed.top_k = Some(top_k);
            }
            "--strategy" => {
                parsed.strategy = Some(
                    value("--strategy")?
                        .parse::<RetrievalStrategy>()
                        .map_err(anyhow::Error::msg)?,
                )
            }
            "--templates" => parsed.templates = Some(PathBuf::from(value("--templates")?)),
            "--scores" => parsed.scores = true,
            flag if flag.starts_with("--") => anyhow::bail!("Unknown option: {}", flag),
            word => words.push(word.to_string()),
        }
    }

    parsed.request.text = words.join(" ");
    Ok(parsed)
}

fn load_store(config: &Config, dir: Option<PathBuf>) -> Result<Arc<TemplateStore>> {
    let dir = dir.unwrap_or_else(|| config.templates.dir.clone());
    let store = TemplateStore::load(
        &dir,
        &config.templates.extension,
        config.templates.on_read_error,
    )?;
    for warning in store.warnings() {
        eprintln!("Warning: {}", warning);
    }
    Ok(Arc::new(store))
}

async fn run_draft(config: Config, args: &[String]) -> Result<()> {
    let args = parse_draft_args(args)?;
    anyhow::ensure!(
        !args.request.text.trim().is_empty(),
        "Please enter an email request. See 'draftsmith help'."
    );

    let (api_key, source) = CredentialStore::new(&config).api_key()?;
    tracing::debug!("Using API key from {}", source);
    let client = CompletionClient::new(api_key, &config.ai)?;

    let store = load_store(&config, args.templates)?;
    let strategy = args.strategy.unwrap_or(config.retrieval.strategy);
    let drafter = Drafter::new(Retriever::new(store, strategy), client)
        .with_top_k(args.top_k.unwrap_or(config.retrieval.top_k))
        .with_relevance(args.scores);

    let draft = drafter.draft(&args.request).await?;
    println!("{}", draft.text);

    if !draft.relevance.is_empty() {
        println!(
            "\nTemplate relevance ({:?}):",
            drafter.retriever().strategy()
        );
        for score in &draft.relevance {
            println!("  {}", score);
        }
    }

    if draft.quota_exceeded {
        tracing::warn!("Draft not generated: quota exceeded");
    }
    Ok(())
}

fn run_scores(config: Config, args: &[String]) -> Result<()> {
    let args = parse_draft_args(args)?;
    anyhow::ensure!(
        !args.request.text.trim().is_empty(),
        "Please enter an email request."
    );

    let store = load_store(&config, args.templates)?;
    let strategy = args.strategy.unwrap_or(config.retrieval.strategy);
    let retriever = Retriever::new(store, strategy);
    for score in retriever.relevance(&args.request.text) {
        println!("{}", score);
    }
    Ok(())
}

fn run_templates(config: Config, args: &[String]) -> Result<()> {
    let args = parse_draft_args(args)?;
    let store = load_store(&config, args.templates)?;
    if store.is_empty() {
        println!("No templates found.");
    }
    for (name, content) in store.iter() {
        let first_line = content.lines().next().unwrap_or_default();
        println!("{:<20} {}", name, first_line);
    }
    Ok(())
}

fn run_setup(config: Config) -> Result<()> {
    use std::io::{self, Write};

    println!("Draftsmith Setup");
    println!("================\n");

    print!("API key: ");
    io::stdout().flush()?;
    let key = read_secret()?;
    println!();

    let source = CredentialStore::new(&config).set_api_key(&key)?;
    println!("API key stored in {}.", source);
    Ok(())
}

fn read_secret() -> Result<String> {
    use std::io;

    // Disable echo
    let _guard = DisableEcho::new()?;

    let mut secret = String::new();
    io::stdin().read_line(&mut secret)?;
    Ok(secret.trim().to_string())
}

struct DisableEcho {
    #[cfg(unix)]
    original: libc::termios,
}

impl DisableEcho {
    #[cfg(unix)]
    fn new() -> Result<Self> {
        use std::mem::MaybeUninit;
        use std::os::unix::io::AsRawFd;

        let fd = std::io::stdin().as_raw_fd();
        let mut termios = MaybeUninit::<libc::termios>::uninit();

        unsafe {
            if libc::tcgetattr(fd, termios.as_mut_ptr()) != 0 {
                anyhow::bail!("Failed to get terminal attributes");
            }
            let original = termios.assume_init();
            let mut new = original;
            new.c_lflag &= !libc::ECHO;
            if libc::tcsetattr(fd, libc::TCSANOW, &new) != 0 {
                anyhow::bail!("Failed to set terminal attributes");
            }
            Ok(Self { original })
        }
    }

    #[cfg(not(unix))]
    fn new() -> Result<Self> {
        Ok(Self {})
    }
}

#[cfg(unix)]
impl Drop for DisableEcho {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        let fd = std::io::stdin().as_raw_fd();
        unsafe {
            libc::tcsetattr(fd, libc::TCSANOW, &self.original);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let command = args.get(1).map(|s| s.as_str());
    if matches!(command, None | Some("help") | Some("--help") | Some("-h")) {
        print_usage();
        return Ok(());
    }

    setup_logging();
    let config = Config::load()?;
    let rest = &args[2..];

    match command {
        Some("draft") => run_draft(config, rest).await,
        Some("scores") => run_scores(config, rest),
        Some("templates") => run_templates(config, rest),
        Some("setup") => run_setup(config),
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
        None => Ok(()),
    }
}
