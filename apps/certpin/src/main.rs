use std::{io::Write, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use certpin::{
    CertificateBundle, Fingerprint, Hostname, PinManifest, PinSet, PinnedCertificate, PinnedClient, PinningPolicy,
    RootSource, UnpinnedHostPolicy, HTTPS_PORT,
};

// Bundle resource pinned by --simulate-corruption.
const CORRUPTED: &str = "corrupted";

#[derive(Parser)]
#[command(name = "certpin", version, about = "HTTPS requests with certificate pinning")]
struct Cli {
    // Trust anchors for system chain validation
    #[arg(long, value_enum, default_value_t = Roots::Webpki, global = true)]
    roots: Roots,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Roots {
    /// Bundled Mozilla root program
    Webpki,
    /// Operating system trust store
    Native,
}

impl From<Roots> for RootSource {
    fn from(r: Roots) -> Self {
        match r {
            Roots::Webpki => RootSource::WebPki,
            Roots::Native => RootSource::Native,
        }
    }
}

#[derive(Args)]
struct Target {
    // Server hostname; also the default bundle certificate name
    #[arg(long, default_value = "github.com")]
    host: String,

    #[arg(long, default_value_t = HTTPS_PORT)]
    port: u16,

    // Connect + request timeout, seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Args)]
struct Pins {
    /// TOML pin manifest (overrides --bundle/--pin)
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Directory of <name>.cer files
    #[arg(long, default_value = "certs")]
    bundle: PathBuf,

    /// Extra pin, HOST=FILE. Can be repeated.
    #[arg(long, value_parser = parse_pin)]
    pin: Vec<(String, PathBuf)>,

    /// Pin the bundle's corrupted certificate for the target host instead
    #[arg(long, default_value_t = false)]
    simulate_corruption: bool,

    /// Accept hosts without pins on system trust alone
    #[arg(long, default_value_t = false)]
    allow_unpinned: bool,
}

#[derive(Subcommand)]
enum Command {
    // Pinned HTTPS GET; the body goes to stdout.
    Get {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        pins: Pins,

        #[arg(long, default_value = "/")]
        path: String,
    },

    // Handshake only, report whether the server certificate was accepted.
    Probe {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        pins: Pins,
    },

    // Load a DER certificate as a pin and print its fingerprints.
    Fingerprint {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "certpin=info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let roots = RootSource::from(cli.roots);

    match cli.cmd {
        Command::Get { target, pins, path } => run_get(target, pins, path, roots).await,
        Command::Probe { target, pins } => run_probe(target, pins, roots).await,
        Command::Fingerprint { file } => run_fingerprint(file),
    }
}

async fn run_get(target: Target, pins: Pins, path: String, roots: RootSource) -> Result<()> {
    let client = build_client(&target, &pins, roots)?;

    let response = client.get(&target.host, target.port, &path).await?;
    eprintln!("{}", response.status_line);

    let mut out = std::io::stdout().lock();
    out.write_all(&response.body)?;
    if !response.body.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}

async fn run_probe(target: Target, pins: Pins, roots: RootSource) -> Result<()> {
    let client = build_client(&target, &pins, roots)?;

    if client.probe(&target.host, target.port).await? {
        println!("{}:{} accepted", target.host, target.port);
        Ok(())
    } else {
        println!("{}:{} rejected", target.host, target.port);
        Err(anyhow!("secure connection failed"))
    }
}

fn run_fingerprint(file: PathBuf) -> Result<()> {
    let cert = PinnedCertificate::from_file(&file)?;

    println!("file:   {}", file.display());
    println!("size:   {} bytes", cert.len());
    println!("sha256: {}", cert.fingerprint());
    match cert.spki() {
        Ok(spki) => println!("spki:   {}", Fingerprint::of(spki)),
        Err(e) => println!("spki:   unavailable ({e})"),
    }
    Ok(())
}

fn build_client(target: &Target, pins: &Pins, roots: RootSource) -> Result<PinnedClient> {
    let timeout = Duration::from_secs(target.timeout);

    let client = match &pins.manifest {
        Some(path) => {
            let manifest = PinManifest::from_file(path)?;
            let mut policy = manifest.policy;
            if pins.allow_unpinned {
                policy = policy.with_unpinned_hosts(UnpinnedHostPolicy::SystemTrustOnly);
            }
            PinnedClient::builder()
                .pins(manifest.pin_set()?)
                .policy(policy)
                .bundle(manifest.bundle.clone())
                .roots(roots)
                .timeout(timeout)
                .build()?
        }
        None => {
            let bundle = CertificateBundle::new(&pins.bundle);
            let mut set = PinSet::new();
            for (host, file) in &pins.pin {
                let cert = PinnedCertificate::from_file(file)?;
                set.insert(Hostname::parse(host)?, cert);
            }
            if set.is_empty() {
                let cert = bundle
                    .load(&target.host)
                    .with_context(|| format!("no pin for {} in bundle {}", target.host, bundle.root().display()))?;
                set.insert(Hostname::parse(&target.host)?, cert);
            }

            let mut policy = PinningPolicy::fail_closed();
            if pins.allow_unpinned {
                policy = policy.with_unpinned_hosts(UnpinnedHostPolicy::SystemTrustOnly);
            }
            PinnedClient::builder()
                .pins(set)
                .policy(policy)
                .bundle(bundle)
                .roots(roots)
                .timeout(timeout)
                .build()?
        }
    };

    if pins.simulate_corruption {
        let fingerprint = client
            .repin(&target.host, CORRUPTED)
            .context("--simulate-corruption needs corrupted.cer in the bundle")?;
        tracing::info!(host = %target.host, %fingerprint, "pinned corrupted certificate");
    }

    Ok(client)
}

fn parse_pin(s: &str) -> Result<(String, PathBuf), String> {
    let (host, file) = s.split_once('=').ok_or_else(|| format!("expected HOST=FILE, got {s:?}"))?;
    if host.is_empty() || file.is_empty() {
        return Err(format!("expected HOST=FILE, got {s:?}"));
    }
    Ok((host.to_string(), PathBuf::from(file)))
}
